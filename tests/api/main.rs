mod helpers;
mod test_contacts;
mod test_events;
mod test_health_check;
mod test_users;

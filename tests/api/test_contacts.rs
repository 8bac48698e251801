use serde_json::json;
use crate::helpers::spawn_app;

fn contact_body() -> serde_json::Value {
    json!({
        "name": "Honda Davidson",
        "email": "honda_davidson@gmail.com",
        "subject": "Sponsorship",
        "message": "We would love to sponsor your next hackathon."
    })
}

#[tokio::test]
async fn test_create_contact_persists_the_submission() {
    let app = spawn_app().await;

    let response = app.post_json("/contacts", &contact_body()).await;

    assert_eq!(200, response.status().as_u16());

    let saved = sqlx::query!("SELECT name, email, subject, message FROM contacts")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch saved contact");

    assert_eq!(saved.email, "honda_davidson@gmail.com");
    assert_eq!(saved.subject, "Sponsorship");
}

#[tokio::test]
async fn test_create_contact_publishes_an_acknowledgement_email() {
    let app = spawn_app().await;
    let subscription = app.subscribe_emails().await;

    app.post_json("/contacts", &contact_body()).await;

    let email = app.next_email(&subscription).await;
    assert_eq!(email["template"], "Contact-Us-Email-Template.html");
    assert_eq!(email["to"], "honda_davidson@gmail.com");
    assert_eq!(email["body"]["name"], "Honda Davidson");
}

#[tokio::test]
async fn test_create_contact_returns_400_for_an_invalid_email() {
    let app = spawn_app().await;
    let mut body = contact_body();
    body["email"] = json!("not-an-email");

    let response = app.post_json("/contacts", &body).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn test_list_contacts_returns_stored_submissions() {
    let app = spawn_app().await;
    app.post_json("/contacts", &contact_body()).await;

    let response = app.get("/contacts").await;

    assert_eq!(200, response.status().as_u16());
    let contacts: Vec<serde_json::Value> =
        response.json().await.expect("Contacts response was not JSON");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["email"], "honda_davidson@gmail.com");
}

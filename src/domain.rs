pub mod email_address;
pub mod person_name;
pub mod student_id;
pub mod application_status;

pub use application_status::ApplicationStatus;
pub use email_address::EmailAddress;
pub use person_name::PersonName;
pub use student_id::StudentId;

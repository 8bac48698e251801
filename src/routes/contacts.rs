use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use crate::domain::email_address::EmailAddress;
use crate::domain::person_name::PersonName;
use crate::email_queue::{ContactAcknowledgementBody, EmailQueue, EmailRequest};

#[derive(serde::Deserialize)]
pub struct NewContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[tracing::instrument(
    name = "Receive a contact-form submission",
    skip(body, pool, email_queue),
    fields(contact_email = %body.email)
)]
pub async fn create_contact(
    body: web::Json<NewContactRequest>,
    pool: web::Data<PgPool>,
    email_queue: web::Data<EmailQueue>,
) -> HttpResponse {
    let body = body.into_inner();
    let email = match EmailAddress::parse(body.email) {
        Ok(email) => email,
        Err(_) => return HttpResponse::BadRequest().finish(),
    };
    let name = match PersonName::parse(body.name) {
        Ok(name) => name,
        Err(_) => return HttpResponse::BadRequest().finish(),
    };

    let record = ContactRecord {
        id: Uuid::new_v4(),
        name: name.as_ref().to_owned(),
        email: email.as_ref().to_owned(),
        subject: body.subject,
        message: body.message,
        created_at: Utc::now(),
    };

    if let Err(e) = insert_contact(&pool, &record).await {
        tracing::error!("Failed to persist contact submission: {:?}", e);
        return HttpResponse::InternalServerError().finish();
    }

    // Acknowledgement mail is fire-and-forget: a queue hiccup must not fail
    // an already-persisted submission
    let acknowledgement = EmailRequest::new(
        "Contact-Us-Email-Template.html",
        email,
        "MS Club SLIIT - We Received Your Message",
        ContactAcknowledgementBody {
            name: record.name.clone(),
        },
    );
    match acknowledgement {
        Ok(request) => {
            if let Err(e) = email_queue.publish(&request).await {
                tracing::error!("Failed to publish contact acknowledgement email: {:?}", e);
            }
        }
        Err(e) => {
            tracing::error!("Failed to serialize contact acknowledgement email: {:?}", e);
        }
    }

    HttpResponse::Ok().json(record)
}

#[tracing::instrument(name = "Saving contact submission in database", skip(pool, record))]
async fn insert_contact(pool: &PgPool, record: &ContactRecord) -> Result<(), sqlx::Error> {
    sqlx::query!(
        r#"
            INSERT INTO contacts (id, name, email, subject, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        record.id,
        record.name,
        record.email,
        record.subject,
        record.message,
        record.created_at
    )
        .execute(pool)
        .await?;
    Ok(())
}

#[tracing::instrument(name = "List contact submissions", skip(pool))]
pub async fn list_contacts(pool: web::Data<PgPool>) -> HttpResponse {
    let result = sqlx::query_as!(
        ContactRecord,
        r#"
            SELECT id, name, email, subject, message, created_at
            FROM contacts
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
        "#
    )
        .fetch_all(pool.get_ref())
        .await;

    match result {
        Ok(contacts) => HttpResponse::Ok().json(contacts),
        Err(e) => {
            tracing::error!("Failed to fetch contact submissions: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

use std::fmt::{Debug, Formatter};
use actix_web::{web, HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use crate::configuration::ApplicationSettings;
use crate::domain::application_status::ApplicationStatus;
use crate::domain::email_address::EmailAddress;
use crate::domain::person_name::PersonName;
use crate::domain::student_id::StudentId;
use crate::email_queue::{
    ApplicationReceivedBody, EmailQueue, EmailRequest, InterviewBody, SelectedBody,
};
use crate::meeting_client::{MeetingClient, MeetingScheduleRequest};
use crate::routes::error_chain_fmt;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplicationRequest {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub current_academic_year: String,
    pub linked_in: Option<String>,
    pub git_hub: Option<String>,
    pub skills_and_talents: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest {
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub format: String,
    pub attendees: Vec<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub current_academic_year: String,
    pub linked_in: Option<String>,
    pub git_hub: Option<String>,
    pub skills_and_talents: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(thiserror::Error)]
pub enum ApplicationError {
    #[error("{0}")]
    ValidationError(String),
    #[error("application not found")]
    NotFound,
    #[error("cannot move an application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("the meeting manager refused the interview schedule")]
    MeetingApiError(#[source] reqwest::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for ApplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApplicationError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApplicationError::NotFound => StatusCode::NOT_FOUND,
            ApplicationError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ApplicationError::MeetingApiError(_) => StatusCode::BAD_GATEWAY,
            ApplicationError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tracing::instrument(
    name = "Submit a recruitment application",
    skip(body, pool, email_queue),
    fields(applicant_email = %body.email, student_id = %body.student_id)
)]
pub async fn submit_application(
    body: web::Json<NewApplicationRequest>,
    pool: web::Data<PgPool>,
    email_queue: web::Data<EmailQueue>,
) -> Result<HttpResponse, ApplicationError> {
    let body = body.into_inner();
    let email =
        EmailAddress::parse(body.email).map_err(ApplicationError::ValidationError)?;
    let name = PersonName::parse(body.name).map_err(ApplicationError::ValidationError)?;
    let student_id =
        StudentId::parse(body.student_id).map_err(ApplicationError::ValidationError)?;

    let now = Utc::now();
    let record = ApplicationRecord {
        id: Uuid::new_v4(),
        student_id: student_id.as_ref().to_owned(),
        name: name.as_ref().to_owned(),
        email: email.as_ref().to_owned(),
        contact_number: body.contact_number,
        current_academic_year: body.current_academic_year,
        linked_in: body.linked_in,
        git_hub: body.git_hub,
        skills_and_talents: body.skills_and_talents,
        status: ApplicationStatus::Pending.as_str().to_owned(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    insert_application(&pool, &record)
        .await
        .context("Failed to insert a new application")?;

    // Acknowledgement mail is fire-and-forget; the application is already saved
    let received = EmailRequest::new(
        "Application-Email-Template.html",
        email,
        "MS Club SLIIT - Application Received",
        ApplicationReceivedBody {
            student_id: record.student_id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            contact_number: record.contact_number.clone(),
            current_academic_year: record.current_academic_year.clone(),
            linked_in: record.linked_in.clone(),
            git_hub: record.git_hub.clone(),
            skills_and_talents: record.skills_and_talents.clone(),
        },
    )
    .context("Failed to serialize the application-received email")?;
    if let Err(e) = email_queue.publish(&received).await {
        tracing::error!("Failed to publish application-received email: {:?}", e);
    }

    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(name = "Get an application by id", skip(pool))]
pub async fn get_application(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApplicationError> {
    let record = fetch_application(&pool, path.into_inner())
        .await
        .context("Failed to fetch the application")?
        .ok_or(ApplicationError::NotFound)?;
    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(name = "List applications", skip(pool))]
pub async fn list_applications(
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApplicationError> {
    let records = sqlx::query_as!(
        ApplicationRecord,
        r#"
            SELECT id, student_id, name, email, contact_number, current_academic_year,
                   linked_in, git_hub, skills_and_talents, status,
                   created_at, updated_at, deleted_at
            FROM applications
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
        "#
    )
        .fetch_all(pool.get_ref())
        .await
        .context("Failed to list applications")?;
    Ok(HttpResponse::Ok().json(records))
}

/// Admin view of archived applications.
#[tracing::instrument(name = "List archived applications", skip(pool))]
pub async fn list_deleted_applications(
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApplicationError> {
    let records = sqlx::query_as!(
        ApplicationRecord,
        r#"
            SELECT id, student_id, name, email, contact_number, current_academic_year,
                   linked_in, git_hub, skills_and_talents, status,
                   created_at, updated_at, deleted_at
            FROM applications
            WHERE deleted_at IS NOT NULL
            ORDER BY deleted_at DESC
        "#
    )
        .fetch_all(pool.get_ref())
        .await
        .context("Failed to list archived applications")?;
    Ok(HttpResponse::Ok().json(records))
}

#[tracing::instrument(name = "List applications by status", skip(pool))]
pub async fn list_applications_by_status(
    path: web::Path<String>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApplicationError> {
    let status = ApplicationStatus::parse(&path.into_inner())
        .map_err(ApplicationError::ValidationError)?;

    let records = sqlx::query_as!(
        ApplicationRecord,
        r#"
            SELECT id, student_id, name, email, contact_number, current_academic_year,
                   linked_in, git_hub, skills_and_talents, status,
                   created_at, updated_at, deleted_at
            FROM applications
            WHERE status = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
        "#,
        status.as_str()
    )
        .fetch_all(pool.get_ref())
        .await
        .context("Failed to list applications by status")?;
    Ok(HttpResponse::Ok().json(records))
}

#[tracing::instrument(
    name = "Move an application to INTERVIEW",
    skip(body, pool, email_queue, meeting_client, settings)
)]
pub async fn schedule_interview(
    path: web::Path<Uuid>,
    body: web::Json<InterviewRequest>,
    pool: web::Data<PgPool>,
    email_queue: web::Data<EmailQueue>,
    meeting_client: web::Data<MeetingClient>,
    settings: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, ApplicationError> {
    let body = body.into_inner();
    let mut record = load_active_application(&pool, path.into_inner()).await?;
    // Early check so an obviously illegal request never books a meeting;
    // the conditional write below is the real authority
    let from = check_transition(&record, ApplicationStatus::Interview)?;

    let student_id = StudentId::parse(record.student_id.clone())
        .map_err(|e| anyhow::anyhow!("Stored student id is invalid: {}", e))?;
    let applicant_email = EmailAddress::parse(record.email.clone())
        .map_err(|e| anyhow::anyhow!("Stored applicant email is invalid: {}", e))?;

    // The meeting is booked before the status write: if the meeting manager
    // is down the application stays PENDING and the call can be retried
    let mut email_list = body.attendees.clone();
    email_list.push(student_id.email_in(&settings.applicant_email_domain));
    meeting_client
        .schedule(&MeetingScheduleRequest {
            student_name: record.name.clone(),
            start_date_time: body.start_date_time,
            end_date_time: body.end_date_time,
            email_list,
        })
        .await
        .map_err(ApplicationError::MeetingApiError)?;

    let updated_at = match update_status(&pool, record.id, from, ApplicationStatus::Interview)
        .await
        .context("Failed to update the application status")?
    {
        Some(updated_at) => updated_at,
        // The row moved (or was archived) between our read and the write
        None => return Err(stale_transition_error(&pool, record.id, ApplicationStatus::Interview).await),
    };
    record.status = ApplicationStatus::Interview.as_str().to_owned();
    record.updated_at = updated_at;

    let invitation = EmailRequest::new(
        "Interview-Email-Template.html",
        applicant_email,
        "MS Club of SLIIT - Interview",
        InterviewBody {
            name: record.name.clone(),
            email: record.email.clone(),
            date: body.start_date_time.format("%B %-d, %Y").to_string(),
            time: body.start_date_time.format("%-I:%M:%S %p").to_string(),
            format: body.format,
        },
    )
    .context("Failed to serialize the interview email")?;
    if let Err(e) = email_queue.publish(&invitation).await {
        tracing::error!("Failed to publish interview email: {:?}", e);
    }

    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(name = "Move an application to SELECTED", skip(pool, email_queue))]
pub async fn select_applicant(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    email_queue: web::Data<EmailQueue>,
) -> Result<HttpResponse, ApplicationError> {
    let mut record = load_active_application(&pool, path.into_inner()).await?;
    let from = check_transition(&record, ApplicationStatus::Selected)?;
    let applicant_email = EmailAddress::parse(record.email.clone())
        .map_err(|e| anyhow::anyhow!("Stored applicant email is invalid: {}", e))?;

    let updated_at = match update_status(&pool, record.id, from, ApplicationStatus::Selected)
        .await
        .context("Failed to update the application status")?
    {
        Some(updated_at) => updated_at,
        None => return Err(stale_transition_error(&pool, record.id, ApplicationStatus::Selected).await),
    };
    record.status = ApplicationStatus::Selected.as_str().to_owned();
    record.updated_at = updated_at;

    let congratulations = EmailRequest::new(
        "Selected-Email-Template.html",
        applicant_email,
        "Congratulations from MS Club Team !",
        SelectedBody {
            name: record.name.clone(),
        },
    )
    .context("Failed to serialize the selection email")?;
    if let Err(e) = email_queue.publish(&congratulations).await {
        tracing::error!("Failed to publish selection email: {:?}", e);
    }

    Ok(HttpResponse::Ok().json(record))
}

/// No email on rejection.
#[tracing::instrument(name = "Move an application to REJECTED", skip(pool))]
pub async fn reject_applicant(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApplicationError> {
    let mut record = load_active_application(&pool, path.into_inner()).await?;
    let from = check_transition(&record, ApplicationStatus::Rejected)?;

    let updated_at = match update_status(&pool, record.id, from, ApplicationStatus::Rejected)
        .await
        .context("Failed to update the application status")?
    {
        Some(updated_at) => updated_at,
        None => return Err(stale_transition_error(&pool, record.id, ApplicationStatus::Rejected).await),
    };
    record.status = ApplicationStatus::Rejected.as_str().to_owned();
    record.updated_at = updated_at;

    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(name = "Archive an application", skip(pool))]
pub async fn archive_application(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApplicationError> {
    let outcome = sqlx::query!(
        r#"
            UPDATE applications
            SET deleted_at = $2
            WHERE id = $1 AND deleted_at IS NULL
        "#,
        path.into_inner(),
        Utc::now()
    )
        .execute(pool.get_ref())
        .await
        .context("Failed to archive the application")?;

    if outcome.rows_affected() == 0 {
        // missing or already archived
        return Err(ApplicationError::NotFound);
    }
    Ok(HttpResponse::Ok().finish())
}

fn check_transition(
    record: &ApplicationRecord,
    to: ApplicationStatus,
) -> Result<ApplicationStatus, ApplicationError> {
    let from = ApplicationStatus::parse(&record.status)
        .map_err(|e| anyhow::anyhow!("Stored application status is invalid: {}", e))?;
    if !from.can_transition_to(to) {
        return Err(ApplicationError::InvalidTransition { from, to });
    }
    Ok(from)
}

/// Classify a conditional status write that matched no row: the record was
/// archived or moved to another status after we read it.
async fn stale_transition_error(
    pool: &PgPool,
    id: Uuid,
    to: ApplicationStatus,
) -> ApplicationError {
    match fetch_application(pool, id).await {
        Ok(Some(record)) if record.deleted_at.is_none() => {
            match ApplicationStatus::parse(&record.status) {
                Ok(from) => ApplicationError::InvalidTransition { from, to },
                Err(e) => {
                    anyhow::anyhow!("Stored application status is invalid: {}", e).into()
                }
            }
        }
        Ok(_) => ApplicationError::NotFound,
        Err(e) => anyhow::Error::from(e)
            .context("Failed to re-fetch the application after a stale status write")
            .into(),
    }
}

async fn load_active_application(
    pool: &PgPool,
    id: Uuid,
) -> Result<ApplicationRecord, ApplicationError> {
    let record = fetch_application(pool, id)
        .await
        .context("Failed to fetch the application")?
        .ok_or(ApplicationError::NotFound)?;
    if record.deleted_at.is_some() {
        return Err(ApplicationError::NotFound);
    }
    Ok(record)
}

#[tracing::instrument(name = "Saving new application in database", skip(pool, record))]
async fn insert_application(pool: &PgPool, record: &ApplicationRecord) -> Result<(), sqlx::Error> {
    sqlx::query!(
        r#"
            INSERT INTO applications
                (id, student_id, name, email, contact_number, current_academic_year,
                 linked_in, git_hub, skills_and_talents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        "#,
        record.id,
        record.student_id,
        record.name,
        record.email,
        record.contact_number,
        record.current_academic_year,
        record.linked_in,
        record.git_hub,
        record.skills_and_talents,
        record.status,
        record.created_at
    )
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute `insert_application` query: {:?}", e);
            e
        })?;
    Ok(())
}

#[tracing::instrument(name = "Fetch application record from database", skip(pool))]
async fn fetch_application(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ApplicationRecord>, sqlx::Error> {
    sqlx::query_as!(
        ApplicationRecord,
        r#"
            SELECT id, student_id, name, email, contact_number, current_academic_year,
                   linked_in, git_hub, skills_and_talents, status,
                   created_at, updated_at, deleted_at
            FROM applications
            WHERE id = $1
        "#,
        id
    )
        .fetch_optional(pool)
        .await
}

/// Compare-and-set on the status column: the write only lands if the row
/// still holds `from` and has not been archived. Returns `None` when no row
/// matched, so concurrent transitions cannot both succeed.
#[tracing::instrument(name = "Update application status in database", skip(pool))]
async fn update_status(
    pool: &PgPool,
    id: Uuid,
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let updated_at = Utc::now();
    let outcome = sqlx::query!(
        r#"
            UPDATE applications
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = $4 AND deleted_at IS NULL
        "#,
        id,
        to.as_str(),
        updated_at,
        from.as_str()
    )
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute `update_status` query: {:?}", e);
            e
        })?;
    if outcome.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(updated_at))
}

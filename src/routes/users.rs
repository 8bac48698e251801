use std::fmt::{Debug, Formatter};
use actix_web::{web, HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use anyhow::Context;
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;
use uuid::Uuid;
use crate::authentication::{validate_credentials, AuthError, Credentials};
use crate::domain::email_address::EmailAddress;
use crate::domain::person_name::PersonName;
use crate::routes::error_chain_fmt;
use crate::telemetry::spawn_blocking_with_tracing;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: Secret<String>,
}

#[derive(thiserror::Error)]
pub enum CreateUserError {
    #[error("{0}")]
    ValidationError(String),
    #[error("an account with this email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for CreateUserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for CreateUserError {
    fn status_code(&self) -> StatusCode {
        match self {
            CreateUserError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CreateUserError::DuplicateEmail => StatusCode::CONFLICT,
            CreateUserError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tracing::instrument(
    name = "Create a new user account",
    skip(body, pool),
    fields(user_email = %body.email)
)]
pub async fn create_user(
    body: web::Json<NewUserRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, CreateUserError> {
    let NewUserRequest {
        first_name,
        last_name,
        email,
        phone_number,
        password,
    } = body.into_inner();

    let email = EmailAddress::parse(email).map_err(CreateUserError::ValidationError)?;
    let first_name = PersonName::parse(first_name).map_err(CreateUserError::ValidationError)?;
    let last_name = PersonName::parse(last_name).map_err(CreateUserError::ValidationError)?;

    // Argon2 hashing is CPU heavy, keep it off the async workers
    let password_hash = spawn_blocking_with_tracing(move || {
        crate::authentication::compute_password_hash(password)
    })
        .await
        .context("Failed to spawn the password hashing task")?
        .context("Failed to hash the password")?;

    let user_id = insert_user(&pool, &email, &first_name, &last_name, phone_number, password_hash)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23505") => {
                CreateUserError::DuplicateEmail
            }
            _ => anyhow::Error::from(e)
                .context("Failed to insert a new user account")
                .into(),
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": user_id })))
}

#[tracing::instrument(
    name = "Saving new user account in database",
    skip(pool, phone_number, password_hash)
)]
async fn insert_user(
    pool: &PgPool,
    email: &EmailAddress,
    first_name: &PersonName,
    last_name: &PersonName,
    phone_number: Option<String>,
    password_hash: Secret<String>,
) -> Result<Uuid, sqlx::Error> {
    let user_id = Uuid::new_v4();
    sqlx::query!(
        r#"
            INSERT INTO users (id, first_name, last_name, email, phone_number, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
        user_id,
        first_name.as_ref(),
        last_name.as_ref(),
        email.as_ref(),
        phone_number,
        password_hash.expose_secret(),
        Utc::now()
    )
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute `insert_user` query: {:?}", e);
            e
        })?;
    Ok(user_id)
}

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(thiserror::Error)]
pub enum LoginError {
    #[error("Authentication failed")]
    AuthError(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for LoginError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            LoginError::AuthError(_) => StatusCode::UNAUTHORIZED,
            LoginError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tracing::instrument(
    name = "Login",
    skip(body, pool),
    fields(user_email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, LoginError> {
    let LoginRequest { email, password } = body.into_inner();
    let credentials = Credentials { email, password };

    let user_id = validate_credentials(credentials, &pool)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials(_) => LoginError::AuthError(e.into()),
            AuthError::UnexpectedError(_) => LoginError::UnexpectedError(e.into()),
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "userId": user_id })))
}

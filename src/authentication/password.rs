use anyhow::Context;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash,
    PasswordHasher, PasswordVerifier, Version
};
use argon2::password_hash::SaltString;
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;
use crate::telemetry::spawn_blocking_with_tracing;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid Credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error)
}

/// Accounts are keyed by email address, there is no separate username.
pub struct Credentials {
    pub email: String,
    pub password: Secret<String>
}

#[tracing::instrument(
    name = "Validate Credentials",
    skip(credentials, pool)
)]
pub async fn validate_credentials(
    credentials: Credentials,
    pool: &PgPool
) -> Result<uuid::Uuid, AuthError> {

    // Standardizing the response time for existing and non-existing accounts
    let mut user_id = None;
    let mut expected_password_hash = Secret::new(
        "$argon2id$v=19$m=15000,t=2,p=1$\
        gZiV/M1gPc22ElAH/Jh1Hw$\
        CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno".to_string()
    );

    if let Some((stored_user_id, stored_password_hash)) = get_stored_credentials(
        &credentials.email,
        pool
    )
        .await?
    {
        user_id = Some(stored_user_id);
        expected_password_hash = stored_password_hash;
    }

    // This is a CPU intensive task
    // Offloaded to separate thread via custom spawn_blocking implementation
    // provided in current project's telemetry handling
    spawn_blocking_with_tracing(|| {
        // the separate thread is required, but it is also required to be in current tracing span's
        // scope, which is provided via the spawn_blocking_with_tracing function, in order to
        // inherit the root span's(current thread's) properties, e.g, request_id, http.method,
        // http.route, etc.
        verify_password_hash(
            expected_password_hash,
            credentials.password
        )
    })
        .await
        .context("Failed to spawn the blocking verification task")??;

    // The return value is only set to `Some` if the credentials are found in the store
    // Hence, even if the fallback hash ends up matching the provided password
    // we never authenticate a non-existing account.
    user_id
        .ok_or_else(|| anyhow::anyhow!("unknown email"))
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(
    name = "Verify Password Hash",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(
        expected_password_hash.expose_secret()
    )
        .context("Failed to parse hash in PHC string format")?;

    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash
        )
        .context("Invalid Password")
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(
    name = "Get stored credentials",
    skip(email, pool)
)]
async fn get_stored_credentials(
    email: &str,
    pool: &PgPool
) -> Result<Option<(uuid::Uuid, Secret<String>)>, anyhow::Error> {
    let row = sqlx::query!(
        r#"
        SELECT id, password_hash
        FROM users
        WHERE email = $1 AND deleted_at IS NULL
        "#,
        email
    )
        .fetch_optional(pool)
        .await
        .context("Failed to perform a query to retrieve stored credentials")?
        .map(|row| (row.id, Secret::new(row.password_hash)));
    Ok(row)
}

pub fn compute_password_hash(
    password: Secret<String>
) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).unwrap()
    )
        .hash_password(password.expose_secret().as_bytes(), &salt)?
        .to_string();

    Ok(Secret::new(password_hash))
}

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

// Webinars mirror the event surface; the original kept them as a separate
// collection with its own type field, and so do we.

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebinarRequest {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub date_time: DateTime<Utc>,
    pub tags: Option<Vec<String>>,
    pub link: Option<String>,
    pub registration_link: Option<String>,
    pub webinar_type: String,
    pub created_by: Option<Uuid>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebinarRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub link: Option<String>,
    pub registration_link: Option<String>,
    pub webinar_type: Option<String>,
    pub updated_by: Option<Uuid>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteWebinarRequest {
    pub deleted_by: Option<Uuid>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebinarRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub date_time: DateTime<Utc>,
    pub tags: Option<Vec<String>>,
    pub link: Option<String>,
    pub registration_link: Option<String>,
    pub webinar_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: serde_json::Value,
}

#[tracing::instrument(
    name = "Insert a new webinar",
    skip(body, pool),
    fields(webinar_title = %body.title)
)]
pub async fn insert_webinar(
    body: web::Json<NewWebinarRequest>,
    pool: web::Data<PgPool>,
) -> HttpResponse {
    let body = body.into_inner();
    let id = Uuid::new_v4();
    let now = Utc::now();

    let result = sqlx::query!(
        r#"
            INSERT INTO webinars
                (id, title, description, image_url, date_time, tags, link,
                 registration_link, webinar_type, created_at, updated_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6::text[], $7, $8, $9, $10, $10, $11)
        "#,
        id,
        body.title,
        body.description,
        body.image_url,
        body.date_time,
        body.tags.as_deref(),
        body.link,
        body.registration_link,
        body.webinar_type,
        now,
        body.created_by
    )
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => HttpResponse::Ok().json(WebinarRecord {
            id,
            title: body.title,
            description: body.description,
            image_url: body.image_url,
            date_time: body.date_time,
            tags: body.tags,
            link: body.link,
            registration_link: body.registration_link,
            webinar_type: body.webinar_type,
            created_at: now,
            updated_at: now,
            created_by: body.created_by,
            updated_by: serde_json::Value::Array(Vec::new()),
        }),
        Err(e) => {
            tracing::error!("Failed to insert webinar: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[tracing::instrument(name = "Get a webinar by id", skip(pool))]
pub async fn get_webinar(path: web::Path<Uuid>, pool: web::Data<PgPool>) -> HttpResponse {
    match fetch_webinar(&pool, path.into_inner()).await {
        Ok(Some(webinar)) => HttpResponse::Ok().json(webinar),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            tracing::error!("Failed to fetch webinar: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[tracing::instrument(name = "List webinars", skip(pool))]
pub async fn list_webinars(pool: web::Data<PgPool>) -> HttpResponse {
    let result = sqlx::query_as!(
        WebinarRecord,
        r#"
            SELECT id, title, description, image_url, date_time, tags, link,
                   registration_link, webinar_type, created_at, updated_at,
                   created_by, updated_by
            FROM webinars
            WHERE deleted_at IS NULL
            ORDER BY date_time DESC
        "#
    )
        .fetch_all(pool.get_ref())
        .await;

    match result {
        Ok(webinars) => HttpResponse::Ok().json(webinars),
        Err(e) => {
            tracing::error!("Failed to list webinars: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[tracing::instrument(name = "List past webinars", skip(pool))]
pub async fn past_webinars(pool: web::Data<PgPool>) -> HttpResponse {
    let result = sqlx::query_as!(
        WebinarRecord,
        r#"
            SELECT id, title, description, image_url, date_time, tags, link,
                   registration_link, webinar_type, created_at, updated_at,
                   created_by, updated_by
            FROM webinars
            WHERE deleted_at IS NULL AND date_time < $1
            ORDER BY date_time DESC
        "#,
        Utc::now()
    )
        .fetch_all(pool.get_ref())
        .await;

    match result {
        Ok(webinars) => HttpResponse::Ok().json(webinars),
        Err(e) => {
            tracing::error!("Failed to list past webinars: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[tracing::instrument(name = "Get the upcoming webinar", skip(pool))]
pub async fn upcoming_webinar(pool: web::Data<PgPool>) -> HttpResponse {
    let result = sqlx::query_as!(
        WebinarRecord,
        r#"
            SELECT id, title, description, image_url, date_time, tags, link,
                   registration_link, webinar_type, created_at, updated_at,
                   created_by, updated_by
            FROM webinars
            WHERE deleted_at IS NULL AND date_time >= $1
            ORDER BY date_time ASC
            LIMIT 1
        "#,
        Utc::now()
    )
        .fetch_optional(pool.get_ref())
        .await;

    match result {
        Ok(Some(webinar)) => HttpResponse::Ok().json(webinar),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            tracing::error!("Failed to fetch upcoming webinar: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[tracing::instrument(name = "Update a webinar", skip(body, pool))]
pub async fn update_webinar(
    path: web::Path<Uuid>,
    body: web::Json<UpdateWebinarRequest>,
    pool: web::Data<PgPool>,
) -> HttpResponse {
    let id = path.into_inner();
    let body = body.into_inner();
    let now = Utc::now();

    let result = sqlx::query!(
        r#"
            UPDATE webinars
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url),
                date_time = COALESCE($5, date_time),
                tags = COALESCE($6::text[], tags),
                link = COALESCE($7, link),
                registration_link = COALESCE($8, registration_link),
                webinar_type = COALESCE($9, webinar_type),
                updated_at = $10,
                updated_by = CASE
                    WHEN $11::uuid IS NULL THEN updated_by
                    ELSE updated_by
                        || jsonb_build_object('user', $11::uuid, 'updatedAt', $10::timestamptz)
                END
            WHERE id = $1 AND deleted_at IS NULL
        "#,
        id,
        body.title,
        body.description,
        body.image_url,
        body.date_time,
        body.tags.as_deref(),
        body.link,
        body.registration_link,
        body.webinar_type,
        now,
        body.updated_by
    )
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(outcome) if outcome.rows_affected() == 0 => HttpResponse::NotFound().finish(),
        Ok(_) => match fetch_webinar(&pool, id).await {
            Ok(Some(webinar)) => HttpResponse::Ok().json(webinar),
            Ok(None) => HttpResponse::NotFound().finish(),
            Err(e) => {
                tracing::error!("Failed to fetch webinar after update: {:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
        Err(e) => {
            tracing::error!("Failed to update webinar: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[tracing::instrument(name = "Soft-delete a webinar", skip(body, pool))]
pub async fn delete_webinar(
    path: web::Path<Uuid>,
    body: Option<web::Json<DeleteWebinarRequest>>,
    pool: web::Data<PgPool>,
) -> HttpResponse {
    let deleted_by = body.and_then(|b| b.into_inner().deleted_by);

    let result = sqlx::query!(
        r#"
            UPDATE webinars
            SET deleted_at = $2, deleted_by = $3
            WHERE id = $1 AND deleted_at IS NULL
        "#,
        path.into_inner(),
        Utc::now(),
        deleted_by
    )
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(outcome) if outcome.rows_affected() == 0 => HttpResponse::NotFound().finish(),
        Ok(_) => HttpResponse::Ok().finish(),
        Err(e) => {
            tracing::error!("Failed to soft-delete webinar: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[tracing::instrument(name = "Fetch webinar record from database", skip(pool))]
async fn fetch_webinar(pool: &PgPool, id: Uuid) -> Result<Option<WebinarRecord>, sqlx::Error> {
    sqlx::query_as!(
        WebinarRecord,
        r#"
            SELECT id, title, description, image_url, date_time, tags, link,
                   registration_link, webinar_type, created_at, updated_at,
                   created_by, updated_by
            FROM webinars
            WHERE id = $1 AND deleted_at IS NULL
        "#,
        id
    )
        .fetch_optional(pool)
        .await
}

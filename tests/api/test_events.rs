use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use crate::helpers::spawn_app;

fn event_body(title: &str, offset: Duration) -> serde_json::Value {
    json!({
        "title": title,
        "description": "An evening of lightning talks.",
        "imageUrl": "https://cdn.example.org/banner.png",
        "dateTime": (Utc::now() + offset).to_rfc3339(),
        "tags": ["community", "talks"],
        "eventType": "MEETUP"
    })
}

async fn insert_event(app: &crate::helpers::TestApp, title: &str, offset: Duration) -> Uuid {
    let response = app.post_json("/events", &event_body(title, offset)).await;
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.expect("Insert response was not JSON");
    body["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("Insert response carried no id")
}

#[tokio::test]
async fn test_insert_event_round_trips_through_get() {
    let app = spawn_app().await;

    let id = insert_event(&app, "Lightning Talks", Duration::days(7)).await;

    let response = app.get(&format!("/events/{}", id)).await;
    assert_eq!(200, response.status().as_u16());
    let event: serde_json::Value = response.json().await.expect("Get response was not JSON");
    assert_eq!(event["title"], "Lightning Talks");
    assert_eq!(event["eventType"], "MEETUP");
    assert_eq!(event["tags"], json!(["community", "talks"]));
}

#[tokio::test]
async fn test_get_event_returns_404_for_an_unknown_id() {
    let app = spawn_app().await;

    let response = app.get(&format!("/events/{}", Uuid::new_v4())).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn test_past_and_upcoming_split_on_the_event_date() {
    let app = spawn_app().await;
    insert_event(&app, "Last Year's Hackathon", Duration::days(-365)).await;
    insert_event(&app, "Next Month's Meetup", Duration::days(30)).await;
    insert_event(&app, "Next Week's Meetup", Duration::days(7)).await;

    let past: Vec<serde_json::Value> = app
        .get("/events/past")
        .await
        .json()
        .await
        .expect("Past response was not JSON");
    assert_eq!(past.len(), 1);
    assert_eq!(past[0]["title"], "Last Year's Hackathon");

    // upcoming is the single next event, not a list
    let upcoming: serde_json::Value = app
        .get("/events/upcoming")
        .await
        .json()
        .await
        .expect("Upcoming response was not JSON");
    assert_eq!(upcoming["title"], "Next Week's Meetup");
}

#[tokio::test]
async fn test_upcoming_returns_404_when_nothing_is_scheduled() {
    let app = spawn_app().await;
    insert_event(&app, "Long Gone", Duration::days(-10)).await;

    let response = app.get("/events/upcoming").await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn test_update_event_patches_fields_and_appends_the_audit_entry() {
    let app = spawn_app().await;
    let id = insert_event(&app, "Lightning Talks", Duration::days(7)).await;
    let editor = Uuid::new_v4();

    let response = app
        .put_json(
            &format!("/events/{}", id),
            &json!({ "title": "Lightning Talks v2", "updatedBy": editor }),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let event: serde_json::Value = response.json().await.expect("Update response was not JSON");
    assert_eq!(event["title"], "Lightning Talks v2");
    // untouched fields keep their stored value
    assert_eq!(event["eventType"], "MEETUP");

    let audit = event["updatedBy"]
        .as_array()
        .expect("updatedBy was not an array");
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0]["user"], json!(editor));
}

#[tokio::test]
async fn test_deleted_events_disappear_from_reads() {
    let app = spawn_app().await;
    let id = insert_event(&app, "Lightning Talks", Duration::days(7)).await;

    let response = app.delete(&format!("/events/{}", id)).await;
    assert_eq!(200, response.status().as_u16());

    assert_eq!(404, app.get(&format!("/events/{}", id)).await.status().as_u16());

    let listed: Vec<serde_json::Value> = app
        .get("/events")
        .await
        .json()
        .await
        .expect("List response was not JSON");
    assert!(listed.is_empty());

    // the soft-delete marker survives in the table
    let saved = sqlx::query!("SELECT deleted_at FROM events WHERE id = $1", id)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch deleted event");
    assert!(saved.deleted_at.is_some());
}

#[tokio::test]
async fn test_updating_a_deleted_event_returns_404() {
    let app = spawn_app().await;
    let id = insert_event(&app, "Lightning Talks", Duration::days(7)).await;

    assert_eq!(200, app.delete(&format!("/events/{}", id)).await.status().as_u16());

    let response = app
        .put_json(&format!("/events/{}", id), &json!({ "title": "Lightning Talks v2" }))
        .await;

    assert_eq!(404, response.status().as_u16());

    let saved = sqlx::query!("SELECT title FROM events WHERE id = $1", id)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch deleted event");
    assert_eq!(saved.title, "Lightning Talks");
}

#[tokio::test]
async fn test_deleting_twice_returns_404() {
    let app = spawn_app().await;
    let id = insert_event(&app, "Lightning Talks", Duration::days(7)).await;

    assert_eq!(200, app.delete(&format!("/events/{}", id)).await.status().as_u16());
    assert_eq!(404, app.delete(&format!("/events/{}", id)).await.status().as_u16());
}

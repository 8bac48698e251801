use serde_json::json;
use crate::helpers::spawn_app;

#[tokio::test]
async fn test_create_user_returns_200_and_stores_a_hashed_password() {
    let app = spawn_app().await;
    let body = json!({
        "firstName": "Honda",
        "lastName": "Davidson",
        "email": "honda_davidson@gmail.com",
        "phoneNumber": "+94771234567",
        "password": "everything-has-to-be-a-bike"
    });

    let response = app.post_json("/users", &body).await;

    assert_eq!(200, response.status().as_u16());

    let saved = sqlx::query!("SELECT email, password_hash FROM users")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch saved user");

    assert_eq!(saved.email, "honda_davidson@gmail.com");
    // PHC string, never the plaintext
    assert!(saved.password_hash.starts_with("$argon2id$"));
    assert_ne!(saved.password_hash, "everything-has-to-be-a-bike");
}

#[tokio::test]
async fn test_create_user_returns_409_for_a_duplicate_email() {
    let app = spawn_app().await;
    let body = json!({
        "firstName": "Honda",
        "lastName": "Davidson",
        "email": "honda_davidson@gmail.com",
        "password": "everything-has-to-be-a-bike"
    });
    assert_eq!(200, app.post_json("/users", &body).await.status().as_u16());

    let response = app.post_json("/users", &body).await;

    assert_eq!(409, response.status().as_u16());

    let saved = sqlx::query!(r#"SELECT COUNT(*) as "count!" FROM users"#)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count users");
    assert_eq!(saved.count, 1);
}

#[tokio::test]
async fn test_create_user_returns_400_for_an_invalid_email() {
    let app = spawn_app().await;
    let body = json!({
        "firstName": "Honda",
        "lastName": "Davidson",
        "email": "definitely-not-an-email",
        "password": "everything-has-to-be-a-bike"
    });

    let response = app.post_json("/users", &body).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn test_login_succeeds_with_valid_credentials() {
    let app = spawn_app().await;
    let create = json!({
        "firstName": "Ursula",
        "lastName": "Le Guin",
        "email": "ursula@earthsea.lk",
        "password": "a-wizard-of-earthsea"
    });
    assert_eq!(200, app.post_json("/users", &create).await.status().as_u16());

    let response = app
        .post_json(
            "/login",
            &json!({ "email": "ursula@earthsea.lk", "password": "a-wizard-of-earthsea" }),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.expect("Login response was not JSON");
    assert!(body.get("userId").is_some());
}

#[tokio::test]
async fn test_login_returns_401_for_a_wrong_password() {
    let app = spawn_app().await;
    let create = json!({
        "firstName": "Ursula",
        "lastName": "Le Guin",
        "email": "ursula@earthsea.lk",
        "password": "a-wizard-of-earthsea"
    });
    assert_eq!(200, app.post_json("/users", &create).await.status().as_u16());

    let response = app
        .post_json(
            "/login",
            &json!({ "email": "ursula@earthsea.lk", "password": "the-tombs-of-atuan" }),
        )
        .await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn test_login_returns_401_for_an_unknown_account() {
    let app = spawn_app().await;

    let response = app
        .post_json(
            "/login",
            &json!({ "email": "nobody@nowhere.lk", "password": "whatever" }),
        )
        .await;

    assert_eq!(401, response.status().as_u16());
}

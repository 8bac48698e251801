use once_cell::sync::Lazy;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use wiremock::MockServer;
use club_management_api::configuration::{get_configuration, DatabaseSettings};
use club_management_api::startup::{get_connection_pool, Application};
use club_management_api::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialized once rather than for each test case
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_lvl = "info".into();
    let subscriber_name = "test".into();

    // Cannot assign the output of `get_subscriber` to a variable based on the value of `TEST_LOG`
    // because the sink is part of the type returned by `get_subscriber`, therefore they are not the
    // same type. To work around it, but this is the most straight-forward way of moving forward.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    /// Per-test NATS subject so concurrent tests never see each other's emails
    pub email_subject: String,
    pub nats_connection: async_nats::Connection,
    /// Stands in for the external meeting-scheduling service
    pub meeting_server: MockServer,
    pub api_client: reqwest::Client,
}

/// Spin up the application in the background
/// Return the address of the application i.e localhost:XXXX
pub async fn spawn_app() -> TestApp {

    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // Next invocations get skipped
    Lazy::force(&TRACING);

    let meeting_server = MockServer::start().await;

    // Randomized the configuration to ensure test isolation
    let configuration = {
        // randomize the db name and use it for testing
        let mut c = get_configuration().expect("Failed to get Configuration in spawn_app");
        c.database.database_name = Uuid::new_v4().to_string();
        c.application.port = 0;
        c.email_queue.subject = format!("test.email-requests.{}", Uuid::new_v4());
        c.meeting_manager.base_url = meeting_server.uri();
        c
    };

    configure_database(&configuration.database).await;

    let nats_connection = async_nats::connect(&configuration.email_queue.url)
        .await
        .expect("Failed to connect to NATS in spawn_app");

    // Launch the server using the configuration built
    let application = Application::build(configuration.clone()) // utilizing .clone() to avoid moving the configuration
        .await
        .expect("Failed to build server");

    let address = format!("http://127.0.0.1:{}", application.port());

    // Here we dont .await the call, instead run the process in the background using tokio::spawn function
    // and return the server handle
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        db_pool: get_connection_pool(&configuration.database),
        email_subject: configuration.email_queue.subject,
        nats_connection,
        meeting_server,
        api_client: reqwest::Client::new(),
    }
}

impl TestApp {
    /// Subscribe before firing the request you expect to publish an email
    pub async fn subscribe_emails(&self) -> async_nats::Subscription {
        self.nats_connection
            .subscribe(&self.email_subject)
            .await
            .expect("Failed to subscribe to the email subject")
    }

    pub async fn next_email(&self, subscription: &async_nats::Subscription) -> serde_json::Value {
        let message = tokio::time::timeout(std::time::Duration::from_secs(5), subscription.next())
            .await
            .expect("Timed out waiting for an email request")
            .expect("Email subscription was closed unexpectedly");
        serde_json::from_slice(&message.data).expect("Email payload was not valid JSON")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .put(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str) -> reqwest::Response {
        self.api_client
            .put(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// NOTE: there is no cleanup mechanism for the databases created with random V4 UUIDs.
/// For handling the complete process properly the active connections need to be terminated,
/// and the databases need to be dropped.
pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // create database
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to establish connection in configure_database");

    connection
        .execute(format!(r#"
            CREATE DATABASE "{}";
        "#, config.database_name).as_str())
        .await
        .expect("FAILED to CREATE DATABASE configure_database");

    // Database migrations
    let db_conn_pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to bind address for db spawn_app");

    sqlx::migrate!("./migrations")
        .run(&db_conn_pool)
        .await
        .expect("Failed to exectute migration of database");

    db_conn_pool
}

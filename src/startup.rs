use std::net::TcpListener;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;
use crate::configuration::{ApplicationSettings, DatabaseSettings, Settings};
use crate::email_queue::EmailQueue;
use crate::meeting_client::MeetingClient;
use crate::routes::{
    archive_application, create_contact, create_user, delete_event, delete_webinar,
    get_application, get_event, get_webinar, health_check, insert_event, insert_webinar,
    list_applications, list_applications_by_status, list_contacts, list_deleted_applications,
    list_events, list_webinars, login, past_events, past_webinars, reject_applicant,
    schedule_interview, select_applicant, submit_application, update_event, update_webinar,
    upcoming_event, upcoming_webinar,
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);

        let email_queue = EmailQueue::connect(&configuration.email_queue).await?;
        let meeting_client = MeetingClient::new(
            configuration.meeting_manager.base_url.clone(),
            configuration.meeting_manager.timeout(),
        )?;

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(
            listener,
            connection_pool,
            email_queue,
            meeting_client,
            configuration.application,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .connect_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    email_queue: EmailQueue,
    meeting_client: MeetingClient,
    application_settings: ApplicationSettings,
) -> Result<Server, std::io::Error> {

    // using web::Data to wrap the shared state in smart pointer(Arc)
    // as App required the app_data to implement Clone trait for "T"
    // and in Arc<T> T is clonable, no matter what T is
    let db_pool = web::Data::new(db_pool);
    let email_queue = web::Data::new(email_queue);
    let meeting_client = web::Data::new(meeting_client);
    let application_settings = web::Data::new(application_settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/users", web::post().to(create_user))
            .route("/login", web::post().to(login))
            .route("/contacts", web::post().to(create_contact))
            .route("/contacts", web::get().to(list_contacts))
            .route("/events", web::post().to(insert_event))
            .route("/events", web::get().to(list_events))
            // fixed segments before the id catch-all
            .route("/events/past", web::get().to(past_events))
            .route("/events/upcoming", web::get().to(upcoming_event))
            .route("/events/{id}", web::get().to(get_event))
            .route("/events/{id}", web::put().to(update_event))
            .route("/events/{id}", web::delete().to(delete_event))
            .route("/webinars", web::post().to(insert_webinar))
            .route("/webinars", web::get().to(list_webinars))
            .route("/webinars/past", web::get().to(past_webinars))
            .route("/webinars/upcoming", web::get().to(upcoming_webinar))
            .route("/webinars/{id}", web::get().to(get_webinar))
            .route("/webinars/{id}", web::put().to(update_webinar))
            .route("/webinars/{id}", web::delete().to(delete_webinar))
            .route("/applications", web::post().to(submit_application))
            .route("/applications", web::get().to(list_applications))
            .route("/applications/deleted", web::get().to(list_deleted_applications))
            .route(
                "/applications/status/{status}",
                web::get().to(list_applications_by_status),
            )
            .route("/applications/{id}", web::get().to(get_application))
            .route("/applications/{id}", web::delete().to(archive_application))
            .route(
                "/applications/{id}/interview",
                web::put().to(schedule_interview),
            )
            .route(
                "/applications/{id}/selected",
                web::put().to(select_applicant),
            )
            .route(
                "/applications/{id}/rejected",
                web::put().to(reject_applicant),
            )
            .app_data(db_pool.clone())
            .app_data(email_queue.clone())
            .app_data(meeting_client.clone())
            .app_data(application_settings.clone())
    })
        .listen(listener)?
        .run();
    // No .await here
    Ok(server)
}

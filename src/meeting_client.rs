use chrono::{DateTime, Utc};
use reqwest::Client;

/// Client for the external meeting-scheduling service that books the
/// MS Teams interview call.
pub struct MeetingClient {
    http_client: Client,
    base_url: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingScheduleRequest {
    pub student_name: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub email_list: Vec<String>,
}

impl MeetingClient {
    pub fn new(base_url: String, timeout: std::time::Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, base_url })
    }

    #[tracing::instrument(
        name = "Schedule interview meeting",
        skip(self, request),
        fields(student_name = %request.student_name)
    )]
    pub async fn schedule(&self, request: &MeetingScheduleRequest) -> Result<(), reqwest::Error> {
        let url = format!("{}/api/msteams/schedule", self.base_url);

        self.http_client
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

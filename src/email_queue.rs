use crate::configuration::EmailQueueSettings;
use crate::domain::email_address::EmailAddress;

/// Fire-and-forget publisher of email requests.
///
/// The actual templating and SMTP delivery happen in a worker outside this
/// repository; we only hand it `{template, to, subject, body}` JSON payloads
/// over a NATS subject.
pub struct EmailQueue {
    connection: async_nats::Connection,
    subject: String,
}

impl EmailQueue {
    pub async fn connect(settings: &EmailQueueSettings) -> anyhow::Result<Self> {
        let connection = async_nats::connect(&settings.url).await?;
        Ok(Self::new(connection, settings.subject.clone()))
    }

    pub fn new(connection: async_nats::Connection, subject: String) -> Self {
        Self { connection, subject }
    }

    #[tracing::instrument(
        name = "Publish email request",
        skip(self, request),
        fields(template = %request.template, recipient = %request.to)
    )]
    pub async fn publish(&self, request: &EmailRequest) -> anyhow::Result<()> {
        self.connection
            .publish(&self.subject, serde_json::to_vec(request)?)
            .await?;
        Ok(())
    }
}

/// Wire shape consumed by the email worker.
#[derive(serde::Serialize)]
pub struct EmailRequest {
    pub template: String,
    pub to: EmailAddress,
    pub subject: String,
    pub body: serde_json::Value,
}

impl EmailRequest {
    pub fn new(
        template: &str,
        to: EmailAddress,
        subject: &str,
        body: impl serde::Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            template: template.to_owned(),
            to,
            subject: subject.to_owned(),
            body: serde_json::to_value(body)?,
        })
    }
}

/// Body for `Application-Email-Template.html`: echoes the submitted fields.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationReceivedBody {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub current_academic_year: String,
    pub linked_in: Option<String>,
    pub git_hub: Option<String>,
    pub skills_and_talents: Option<String>,
}

/// Body for `Interview-Email-Template.html`.
///
/// `date` and `time` are pre-formatted in UTC for the template,
/// e.g. "September 4, 2023" and "8:30:25 PM".
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewBody {
    pub name: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub format: String,
}

/// Body for `Selected-Email-Template.html`.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedBody {
    pub name: String,
}

/// Body for `Contact-Us-Email-Template.html`.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAcknowledgementBody {
    pub name: String,
}

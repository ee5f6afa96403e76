use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::email::EmailDocument;

const RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Posts messages to a Slack incoming webhook
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// One POST. Anything other than 200 is an error.
    pub async fn post(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookMessage { text })
            .send()
            .await
            .context("Failed to send message to Slack webhook")?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Slack webhook returned error: {} - {}", status, error_text);
        }

        Ok(())
    }

    /// Posts each message in order and stops at the first failure. Messages
    /// already sent stay sent.
    pub async fn post_all(&self, messages: &[String]) -> Result<usize> {
        for (index, message) in messages.iter().enumerate() {
            self.post(message)
                .await
                .with_context(|| format!("Failed to post message {} of {}", index + 1, messages.len()))?;
            debug!("Posted message {}/{}", index + 1, messages.len());
        }
        Ok(messages.len())
    }
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Sends a rendered digest through the Resend email API
pub struct EmailNotifier {
    client: Client,
    api_key: String,
    endpoint: String,
    from: String,
    to: String,
}

impl EmailNotifier {
    pub fn new(api_key: String, from: String, to: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            endpoint: RESEND_URL.to_string(),
            from,
            to,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sends the document in a single request. The API's status is logged and
    /// returned, never checked.
    pub async fn send(&self, document: &EmailDocument) -> Result<StatusCode> {
        let request = EmailRequest {
            from: &self.from,
            to: vec![self.to.as_str()],
            subject: &document.subject,
            html: &document.html,
            text: &document.text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send email request")?;

        let status = response.status();
        info!("Email API responded with {}", status);
        Ok(status)
    }
}

pub mod message;

use std::time::Duration;

use serde_json::Value;

use crate::error::AppError;
use message::SlackMessage;

pub struct SlackClient {
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self { client })
    }

    /// Deliver a message to an incoming webhook. The reply body is returned
    /// as JSON when it parses, otherwise as a JSON string (Slack answers `ok`).
    pub async fn post(&self, url: &str, message: &SlackMessage) -> Result<Value, AppError> {
        let resp = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Slack request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read Slack response: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Slack responded {}: {}",
                status.as_u16(),
                text.chars().take(1024).collect::<String>()
            )));
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

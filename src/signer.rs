//! Form-side signer: turns the latest submission into a signed relay request.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::crypto;
use crate::headers::{HEADER_FORM_HASH, HEADER_FORM_ID, HEADER_FORM_TITLE, HEADER_FORM_TS};

/// A single answer as reported by the forms host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub question: String,
    pub answer: Answer,
}

pub type Submission = Vec<ItemResponse>;

#[derive(Debug, Clone)]
pub struct SignerConfig {
    pub relay_url: String,
    pub form_id: String,
    pub form_title: String,
    pub secret: String,
}

impl SignerConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(SignerConfig {
            relay_url: env_required("HOOKHUB_RELAY_URL")?,
            form_id: env_required("HOOKHUB_FORM_ID")?,
            form_title: std::env::var("HOOKHUB_FORM_TITLE").unwrap_or_default(),
            secret: env_required("HOOKHUB_FORM_SECRET")?,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

/// Everything needed to POST one submission to the relay.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub form_id: String,
    pub form_title: String,
    pub timestamp: i64,
    pub signature: String,
    pub body: Bytes,
}

#[derive(Debug)]
pub enum SignerError {
    Serialize(serde_json::Error),
    Transport(reqwest::Error),
}

impl std::fmt::Display for SignerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignerError::Serialize(err) => write!(f, "Failed to serialize payload: {err}"),
            SignerError::Transport(err) => write!(f, "Relay request failed: {err}"),
        }
    }
}

impl std::error::Error for SignerError {}

impl From<serde_json::Error> for SignerError {
    fn from(err: serde_json::Error) -> Self {
        SignerError::Serialize(err)
    }
}

impl From<reqwest::Error> for SignerError {
    fn from(err: reqwest::Error) -> Self {
        SignerError::Transport(err)
    }
}

/// Build the question -> answer mapping. A repeated question title keeps its
/// first position but takes the later answer.
pub fn build_payload(responses: &[ItemResponse]) -> Map<String, Value> {
    let mut payload = Map::new();
    for item in responses {
        let answer = match &item.answer {
            Answer::Text(text) => Value::String(text.clone()),
            Answer::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        };
        payload.insert(item.question.clone(), answer);
    }
    payload
}

pub struct Signer {
    config: SignerConfig,
    client: reqwest::Client,
}

impl Signer {
    pub fn new(config: SignerConfig) -> Result<Self, SignerError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { config, client })
    }

    /// Sign the most recent submission at the given time. Returns `None` when
    /// nothing has been submitted yet.
    pub fn prepare_at(
        &self,
        submissions: &[Submission],
        timestamp: i64,
    ) -> Result<Option<SignedRequest>, SignerError> {
        let Some(latest) = submissions.last() else {
            return Ok(None);
        };

        let body = serde_json::to_vec(&build_payload(latest))?;
        let signature = crypto::sign(&self.config.form_id, timestamp, &self.config.secret, &body);

        Ok(Some(SignedRequest {
            form_id: self.config.form_id.clone(),
            form_title: self.config.form_title.clone(),
            timestamp,
            signature,
            body: Bytes::from(body),
        }))
    }

    pub fn prepare(&self, submissions: &[Submission]) -> Result<Option<SignedRequest>, SignerError> {
        self.prepare_at(submissions, chrono::Utc::now().timestamp_millis())
    }

    /// POST a signed request to the relay and return the relay's status and body.
    pub async fn send(&self, request: SignedRequest) -> Result<(u16, String), SignerError> {
        send_with(&self.client, &self.config.relay_url, request).await
    }

    /// Fire-and-forget delivery of the latest submission. The relay's answer
    /// is logged and dropped; nothing is retried.
    pub fn submit(&self, submissions: &[Submission]) -> Option<JoinHandle<()>> {
        let request = match self.prepare(submissions) {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("No submissions recorded, nothing to relay");
                return None;
            }
            Err(e) => {
                tracing::warn!("{e}");
                return None;
            }
        };

        let client = self.client.clone();
        let url = self.config.relay_url.clone();

        Some(tokio::spawn(async move {
            match send_with(&client, &url, request).await {
                Ok((status, body)) => tracing::debug!("Relay answered {status}: {body}"),
                Err(e) => tracing::warn!("{e}"),
            }
        }))
    }
}

async fn send_with(
    client: &reqwest::Client,
    url: &str,
    request: SignedRequest,
) -> Result<(u16, String), SignerError> {
    let resp = client
        .post(url)
        .header("Content-Type", "application/json")
        .header(HEADER_FORM_ID, &request.form_id)
        .header(HEADER_FORM_TITLE, &request.form_title)
        .header(HEADER_FORM_TS, request.timestamp.to_string())
        .header(HEADER_FORM_HASH, &request.signature)
        .body(request.body)
        .send()
        .await?;

    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Ok((status, body))
}

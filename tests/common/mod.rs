#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode as AxumStatus;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use hookhub_forms::config::{Config, RelayConfig};
use hookhub_forms::crypto;

pub const FORM_ID: &str = "1FAIpQLSe-membership";
pub const FORM_SECRET: &str = "membership-secret";
pub const FILTERED_FORM_ID: &str = "1FAIpQLSe-filtered";
pub const FILTERED_SECRET: &str = "filtered-secret";
pub const BROKEN_FORM_ID: &str = "1FAIpQLSe-broken";
pub const SLOW_FORM_ID: &str = "1FAIpQLSe-slow";

/// Messages received by the fake Slack webhook.
pub type Inbox = Arc<Mutex<Vec<Value>>>;

/// A running relay wired to an in-process fake Slack webhook.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub inbox: Inbox,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a body with explicit relay headers, return (body, status).
    pub async fn post_raw(
        &self,
        headers: &[(&str, String)],
        body: impl Into<reqwest::Body>,
    ) -> (Value, StatusCode) {
        let mut req = self
            .client
            .post(self.url("/"))
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            req = req.header(*name, value);
        }
        let resp = req.body(body).send().await.expect("relay request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Sign `body` the way the form-side signer does and POST it.
    pub async fn post_signed(
        &self,
        form_id: &str,
        secret: &str,
        timestamp: i64,
        body: &str,
    ) -> (Value, StatusCode) {
        let signature = crypto::sign(form_id, timestamp, secret, body.as_bytes());
        self.post_raw(&signed_headers(form_id, timestamp, &signature), body.to_string())
            .await
    }

    pub async fn received(&self) -> Vec<Value> {
        self.inbox.lock().await.clone()
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn signed_headers(form_id: &str, timestamp: i64, signature: &str) -> Vec<(&'static str, String)> {
    vec![
        ("X-Hookhub-Google-Form-Id", form_id.to_string()),
        ("X-Hookhub-Google-Form-Title", "Header Title".to_string()),
        ("X-Hookhub-Google-Form-TS", timestamp.to_string()),
        ("X-Hookhub-Google-Form-Hash", signature.to_string()),
    ]
}

async fn slack_ok(State(inbox): State<Inbox>, Json(body): Json<Value>) -> &'static str {
    inbox.lock().await.push(body);
    "ok"
}

async fn slack_fail(State(inbox): State<Inbox>, Json(body): Json<Value>) -> (AxumStatus, &'static str) {
    inbox.lock().await.push(body);
    (AxumStatus::INTERNAL_SERVER_ERROR, "channel_not_found")
}

async fn slack_slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "ok"
}

async fn spawn_fake_slack(inbox: Inbox) -> SocketAddr {
    let app = Router::new()
        .route("/hook", post(slack_ok))
        .route("/fail", post(slack_fail))
        .route("/slow", post(slack_slow))
        .with_state(inbox);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake slack");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake slack failed");
    });

    addr
}

fn relay_config(slack: SocketAddr) -> RelayConfig {
    let raw = json!({
        "slack": {
            "url": format!("http://{slack}/hook"),
            "options": { "username": "Hookhub", "icon_emoji": ":clipboard:", "channel": "#general" }
        },
        "forms": {
            FORM_ID: {
                "secret": FORM_SECRET,
                "slack": {
                    "title": "Membership",
                    "options": { "channel": "#membership" }
                }
            },
            FILTERED_FORM_ID: {
                "secret": FILTERED_SECRET,
                "slack": {
                    "filter": ["Email", "Name"],
                    "answers": false
                }
            },
            BROKEN_FORM_ID: {
                "secret": FORM_SECRET,
                "slack": { "title": "Broken", "url": format!("http://{slack}/fail") }
            },
            SLOW_FORM_ID: {
                "secret": FORM_SECRET,
                "slack": { "title": "Slow", "url": format!("http://{slack}/slow") }
            }
        }
    });
    RelayConfig::from_json(&raw.to_string()).expect("test relay config is valid")
}

/// Spawn the relay on a random port, backed by a fresh fake Slack.
pub async fn spawn_app() -> TestApp {
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    let slack = spawn_fake_slack(inbox.clone()).await;

    let config = Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        forms_path: "unused.json".into(),
        max_body_size: 64 * 1024,
        max_age_ms: 1000,
        max_skew_ms: 1000,
        slack_timeout_secs: 1,
        log_level: "warn".to_string(),
    };

    let app = hookhub_forms::build_app(config, relay_config(slack)).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        inbox,
    }
}

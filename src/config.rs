use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub forms_path: PathBuf,
    pub max_body_size: usize,
    /// Oldest accepted request timestamp, relative to now.
    pub max_age_ms: i64,
    /// Newest accepted request timestamp, relative to now.
    pub max_skew_ms: i64,
    pub slack_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("HOOKHUB_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid HOOKHUB_HOST: {e}"))?;

        let port: u16 = env_or("HOOKHUB_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid HOOKHUB_PORT: {e}"))?;

        let forms_path = PathBuf::from(env_or("HOOKHUB_CONFIG", "config.json"));

        let max_body_size: usize = env_or("HOOKHUB_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid HOOKHUB_MAX_BODY_SIZE: {e}"))?;

        let max_age_ms: i64 = env_or("HOOKHUB_MAX_AGE_MS", "1000")
            .parse()
            .map_err(|e| format!("Invalid HOOKHUB_MAX_AGE_MS: {e}"))?;

        let max_skew_ms: i64 = env_or("HOOKHUB_MAX_SKEW_MS", "1000")
            .parse()
            .map_err(|e| format!("Invalid HOOKHUB_MAX_SKEW_MS: {e}"))?;

        let slack_timeout_secs: u64 = env_or("HOOKHUB_SLACK_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid HOOKHUB_SLACK_TIMEOUT_SECS: {e}"))?;

        let log_level = env_or("HOOKHUB_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            forms_path,
            max_body_size,
            max_age_ms,
            max_skew_ms,
            slack_timeout_secs,
            log_level,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// The forms table and Slack defaults, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub slack: SlackDefaults,
    #[serde(default)]
    pub forms: HashMap<String, FormConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackDefaults {
    pub url: String,
    #[serde(default)]
    pub options: SlackOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SlackOptions {
    pub username: Option<String>,
    pub icon_emoji: Option<String>,
    pub channel: Option<String>,
}

impl SlackOptions {
    /// Fields set on `self` win; anything unset falls back to `defaults`.
    pub fn merged_over(&self, defaults: &SlackOptions) -> SlackOptions {
        SlackOptions {
            username: self.username.clone().or_else(|| defaults.username.clone()),
            icon_emoji: self.icon_emoji.clone().or_else(|| defaults.icon_emoji.clone()),
            channel: self.channel.clone().or_else(|| defaults.channel.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormConfig {
    pub secret: String,
    #[serde(default)]
    pub slack: FormSlackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormSlackConfig {
    pub title: Option<String>,
    #[serde(default)]
    pub options: SlackOptions,
    #[serde(default)]
    pub filter: Vec<String>,
    #[serde(default = "default_answers")]
    pub answers: bool,
    /// Overrides the global webhook URL for this form.
    pub url: Option<String>,
}

impl Default for FormSlackConfig {
    fn default() -> Self {
        Self {
            title: None,
            options: SlackOptions::default(),
            filter: Vec::new(),
            answers: default_answers(),
            url: None,
        }
    }
}

fn default_answers() -> bool {
    true
}

impl RelayConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        Self::from_json(&raw).map_err(|e| format!("Invalid {}: {e}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        let config: RelayConfig = serde_json::from_str(raw).map_err(|e| e.to_string())?;

        if config.slack.url.is_empty() {
            return Err("slack.url must not be empty".to_string());
        }

        for (id, form) in &config.forms {
            if form.secret.is_empty() {
                return Err(format!("forms.{id}.secret must not be empty"));
            }
        }

        Ok(config)
    }
}

//! Sign the latest form submission and relay it.
//!
//! Reads submissions as JSON from stdin, oldest first:
//! `[[{"question": "Name", "answer": "Ada"}, ...], ...]`

use std::io::Read;

use tracing_subscriber::EnvFilter;

use hookhub_forms::signer::{Signer, SignerConfig, Submission};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(std::env::var("HOOKHUB_LOG_LEVEL").unwrap_or_else(|_| "info".into()))
        }))
        .with_writer(std::io::stderr)
        .init();

    let config = SignerConfig::from_env()?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let submissions: Vec<Submission> = serde_json::from_str(&input)?;

    let signer = Signer::new(config)?;

    // The relay's answer is not inspected; only wait so the process does not
    // exit before the request goes out.
    if let Some(handle) = signer.submit(&submissions) {
        let _ = handle.await;
    }

    Ok(())
}

pub mod config;
pub mod error;
pub mod state;
pub mod middleware;
pub mod routes;
pub mod slack;
pub mod signer;
pub mod crypto;
pub mod headers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, RelayConfig};
use crate::slack::SlackClient;
use crate::state::{AppState, SharedState};

pub fn build_app(config: Config, relay: RelayConfig) -> Result<Router, String> {
    let slack = SlackClient::new(Duration::from_secs(config.slack_timeout_secs))?;

    tracing::info!("Loaded {} form(s)", relay.forms.len());

    let state: SharedState = Arc::new(AppState {
        config,
        relay,
        slack,
    });

    let app = Router::new()
        .merge(routes::relay_routes(state.clone()))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state);

    Ok(app)
}

async fn health() -> &'static str {
    "ok"
}

use axum::extract::{Extension, State};
use axum::Json;
use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::middleware::guards::{FormContext, RelayRequest};
use crate::slack::message::{self, MessageParams};
use crate::state::SharedState;

/// Forward a verified submission to Slack and echo Slack's reply.
pub async fn relay(
    State(state): State<SharedState>,
    Extension(request): Extension<RelayRequest>,
    Extension(form): Extension<FormContext>,
) -> Result<Json<Value>, AppError> {
    let answers: Map<String, Value> = serde_json::from_slice(&request.body).map_err(|e| {
        tracing::debug!("Relay body for form {} is not a JSON object: {e}", form.id);
        AppError::InvalidRequest("Missing or invalid request arguments".to_string())
    })?;

    let slack = &form.config.slack;
    let title = slack
        .title
        .as_deref()
        .or(request.form_title.as_deref())
        .unwrap_or(&form.id);

    let params = MessageParams {
        form_id: &form.id,
        title,
        options: slack.options.merged_over(&state.relay.slack.options),
        filter: &slack.filter,
        include_answers: slack.answers,
        now: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
    };
    let message = message::build(&params, &answers);

    let url = slack.url.as_deref().unwrap_or(&state.relay.slack.url);
    let reply = state.slack.post(url, &message).await?;

    tracing::info!("Relayed submission for form {} ({} answers)", form.id, answers.len());

    Ok(Json(json!({ "result": "OK", "message": reply })))
}

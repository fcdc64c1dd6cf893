//! The relay's validation chain. Each stage either rejects the request with a
//! terminal error or enriches the request extensions for the next stage:
//!
//! 1. [`check_headers`] -> [`RelayRequest`]
//! 2. [`lookup_form`] -> [`FormContext`]
//! 3. [`verify_signature`]

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::FormConfig;
use crate::crypto;
use crate::error::AppError;
use crate::headers::{HEADER_FORM_HASH, HEADER_FORM_ID, HEADER_FORM_TITLE, HEADER_FORM_TS};
use crate::state::SharedState;

/// Transport attributes of a relay request plus its raw body.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub form_id: String,
    pub form_title: Option<String>,
    pub timestamp: i64,
    pub signature: String,
    pub body: Bytes,
}

/// The matched form entry together with its identifier.
#[derive(Debug, Clone)]
pub struct FormContext {
    pub id: String,
    pub config: FormConfig,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Like [`header`] but accepts UTF-8 beyond ASCII, for human-readable values.
fn text_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_headers(headers: &HeaderMap) -> Option<(String, Option<String>, i64, String)> {
    let form_id = header(headers, HEADER_FORM_ID)?.to_string();
    let signature = header(headers, HEADER_FORM_HASH)?.to_string();
    let timestamp = header(headers, HEADER_FORM_TS)?.parse::<i64>().ok()?;
    let form_title = text_header(headers, HEADER_FORM_TITLE).map(str::to_string);
    Some((form_id, form_title, timestamp, signature))
}

fn invalid_arguments() -> AppError {
    AppError::InvalidRequest("Missing or invalid request arguments".to_string())
}

pub async fn check_headers(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    let Some((form_id, form_title, timestamp, signature)) = parse_headers(&parts.headers) else {
        return invalid_arguments().into_response();
    };

    let body = match axum::body::to_bytes(body, state.config.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Failed to read relay body: {e}");
            return invalid_arguments().into_response();
        }
    };

    if body.is_empty() || std::str::from_utf8(&body).is_err() {
        return invalid_arguments().into_response();
    }

    let mut req = Request::from_parts(parts, Body::from(body.clone()));
    req.extensions_mut().insert(RelayRequest {
        form_id,
        form_title,
        timestamp,
        signature,
        body,
    });

    next.run(req).await
}

pub async fn lookup_form(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(request) = req.extensions().get::<RelayRequest>() else {
        return AppError::Internal("lookup_form ran before check_headers".to_string())
            .into_response();
    };

    let Some(form) = state.relay.forms.get(&request.form_id) else {
        tracing::info!("Relay request for unknown form {}", request.form_id);
        return AppError::UnknownForm("Invalid form".to_string()).into_response();
    };

    let context = FormContext {
        id: request.form_id.clone(),
        config: form.clone(),
    };
    req.extensions_mut().insert(context);

    next.run(req).await
}

pub async fn verify_signature(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let (Some(request), Some(form)) = (
        req.extensions().get::<RelayRequest>(),
        req.extensions().get::<FormContext>(),
    ) else {
        return AppError::Internal("verify_signature ran before lookup_form".to_string())
            .into_response();
    };

    // The key is built from the matched form's id, same as the signer.
    if !crypto::verify(
        &form.id,
        request.timestamp,
        &form.config.secret,
        &request.body,
        &request.signature,
    ) {
        tracing::warn!("Signature mismatch for form {}", form.id);
        return AppError::InvalidSignature("Invalid hash".to_string()).into_response();
    }

    let now = chrono::Utc::now().timestamp_millis();
    if !is_fresh(request.timestamp, now, state.config.max_age_ms, state.config.max_skew_ms) {
        tracing::warn!(
            "Timestamp {} outside freshness window for form {} (now {now})",
            request.timestamp,
            form.id
        );
        return AppError::StaleTimestamp("Invalid ts".to_string()).into_response();
    }

    next.run(req).await
}

/// A timestamp is fresh if it lies within `[now - max_age, now + max_skew]`.
pub fn is_fresh(timestamp: i64, now: i64, max_age_ms: i64, max_skew_ms: i64) -> bool {
    timestamp >= now.saturating_sub(max_age_ms) && timestamp <= now.saturating_add(max_skew_ms)
}

//! Authentication middleware for admin routes
//!
//! Requests carry a `timestamp` (Unix epoch ms) and a `hash` (SHA-256
//! over the canonical request JSON plus the shared secret). GET requests
//! put both in the query string and hash the object
//! `{"timestamp": <ms>}`; body-carrying requests put them in the JSON
//! body, which is hashed whole. A shared secret of 0 disables checking.

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use organlink_common::api::auth::{validate_hash, validate_timestamp, ApiAuthError};
use organlink_common::api::{AuthErrorResponse, AuthQuery, AuthRequest};

use crate::AppState;

/// Validates timestamp and hash on admin routes; 401 on failure.
///
/// Not applied to public registration, read, or health endpoints.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Secret 0 disables all auth checking
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    if request.method() == Method::GET {
        let Query(auth): Query<AuthQuery> = Query::try_from_uri(request.uri())
            .map_err(|e| AuthError::MissingFields(e.to_string()))?;

        validate_auth(
            auth.timestamp,
            &auth.hash,
            &json!({ "timestamp": auth.timestamp }),
            &state,
        )?;
        return Ok(next.run(request).await);
    }

    // Limit body size to 10MB to bound memory use
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, 10 * 1024 * 1024)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    let json_value: Value = serde_json::from_slice(&body_bytes)
        .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?;

    let auth: AuthRequest = serde_json::from_value(json_value.clone())
        .map_err(|e| AuthError::MissingFields(format!("Missing auth fields: {}", e)))?;

    validate_auth(auth.timestamp, &auth.hash, &json_value, &state)?;

    // Restore the body for downstream handlers
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn validate_auth(
    timestamp: i64,
    hash: &str,
    json_value: &Value,
    state: &AppState,
) -> Result<(), AuthError> {
    validate_timestamp(timestamp).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        _ => AuthError::Other(e.to_string()),
    })?;

    validate_hash(hash, json_value, state.shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidHash {
            provided,
            calculated,
        } => {
            warn!(
                "Hash validation failed: provided={}, calculated={}",
                provided, calculated
            );
            AuthError::InvalidHash
        }
        _ => AuthError::Other(e.to_string()),
    })
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::InvalidTimestamp(reason) => (
                StatusCode::UNAUTHORIZED,
                "timestamp_invalid",
                format!("Invalid timestamp: {}", reason),
            ),
            AuthError::InvalidHash => (
                StatusCode::UNAUTHORIZED,
                "hash_invalid",
                "Invalid hash".to_string(),
            ),
            AuthError::MissingFields(msg) => (
                StatusCode::BAD_REQUEST,
                "missing_fields",
                format!("Missing required fields: {}", msg),
            ),
            AuthError::ParseError(msg) => (
                StatusCode::BAD_REQUEST,
                "parse_error",
                format!("Parse error: {}", msg),
            ),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_error",
                format!("Authentication error: {}", msg),
            ),
        };

        let body = Json(AuthErrorResponse {
            error: error.to_string(),
            message,
            details: None,
        });

        (status, body).into_response()
    }
}

//! Shared API request/response types
//!
//! Authentication payload shapes used by the admin routes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication parameters for GET requests (query parameters)
///
/// # Examples
///
/// ```
/// // GET /api/admin/pending?timestamp=1730000000000&hash=abc123...
/// use organlink_common::api::types::AuthQuery;
///
/// let query = AuthQuery {
///     timestamp: 1730000000000,
///     hash: "abc123...".to_string(),
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,

    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

/// Authentication-only request body for POST/PUT requests with no other
/// payload. Even "empty" admin requests must include auth fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthRequest {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,

    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

/// Error response returned as 401 Unauthorized when authentication fails.
#[derive(Debug, Clone, Serialize)]
pub struct AuthErrorResponse {
    /// Error type identifier, e.g. "timestamp_invalid" or "hash_invalid"
    pub error: String,

    /// Human-readable description
    pub message: String,

    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

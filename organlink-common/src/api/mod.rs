//! Shared HTTP API functionality
//!
//! Authentication primitives and request/response types used by the
//! OrganLink services. This module contains only pure functions, database
//! operations via sqlx, and shared types; axum middleware wrapping these
//! lives in the service crates.

pub mod auth;
pub mod types;

pub use auth::{
    calculate_hash, initialize_shared_secret, load_shared_secret, validate_hash,
    validate_timestamp, ApiAuthError,
};
pub use types::{AuthErrorResponse, AuthQuery, AuthRequest};

//! HTTP endpoint handlers for organlink-cs

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod doctors;
pub mod donors;
pub mod health;
pub mod hospitals;
pub mod matching;
pub mod recipients;
pub mod sse;
pub mod validate;

use serde::Deserialize;

/// Query parameters shared by plain paginated list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

pub(crate) fn default_page() -> i64 {
    1
}

/// Whether an error is a SQLite UNIQUE constraint violation, so handlers
/// can answer 409 instead of 500 for duplicate registrations.
pub(crate) fn is_unique_violation(err: &organlink_common::Error) -> bool {
    if let organlink_common::Error::Database(sqlx::Error::Database(db_err)) = err {
        db_err.message().contains("UNIQUE constraint failed")
    } else {
        false
    }
}

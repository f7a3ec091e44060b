//! Database access for organlink-cs
//!
//! Per-entity query modules over the shared organlink.db pool. Schema
//! creation and migrations live in organlink-common; these modules only
//! read and write rows.

pub mod approvals;
pub mod doctors;
pub mod donors;
pub mod hospitals;
pub mod matches;
pub mod recipients;
pub mod settings;

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use organlink_common::{Error, Result};

/// Pending/approved/rejected tallies for one entity table.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Tally rows by status for one of the four entity tables.
///
/// `table` is always a compile-time constant, never user input.
pub(crate) async fn entity_status_counts(pool: &SqlitePool, table: &str) -> Result<StatusCounts> {
    let sql = format!("SELECT status, COUNT(*) AS n FROM {} GROUP BY status", table);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    let mut counts = StatusCounts::default();
    for row in &rows {
        let status: String = row.get("status");
        let n: i64 = row.get("n");
        counts.total += n;
        match status.as_str() {
            "pending" => counts.pending = n,
            "approved" => counts.approved = n,
            "rejected" => counts.rejected = n,
            _ => {}
        }
    }
    Ok(counts)
}

/// Parse a guid column value stored as TEXT.
pub(crate) fn parse_uuid(raw: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| Error::Internal(format!("Invalid UUID in {}: {}", column, e)))
}

/// Parse a JSON array column holding a list of strings.
pub(crate) fn parse_string_list(raw: &str, column: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Internal(format!("Invalid JSON array in {}: {}", column, e)))
}

/// Serialize a list of strings for a JSON array column.
pub(crate) fn string_list_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values)
        .map_err(|e| Error::Internal(format!("Failed to serialize string list: {}", e)))
}

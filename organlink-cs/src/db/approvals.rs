//! Approval audit trail queries
//!
//! Each admin decision inserts one row here; the entity's own status
//! column carries the current state.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use organlink_common::db::models::{Decision, EntityType};
use organlink_common::Result;

use crate::db::parse_uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub guid: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub decision: Decision,
    pub reviewer: String,
    pub note: Option<String>,
    pub decided_at: String,
}

#[derive(Debug, Clone)]
pub struct NewApproval {
    pub guid: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub decision: Decision,
    pub reviewer: String,
    pub note: Option<String>,
}

fn approval_from_row(row: &SqliteRow) -> Result<Approval> {
    Ok(Approval {
        guid: parse_uuid(&row.get::<String, _>("guid"), "approvals.guid")?,
        entity_type: row.get::<String, _>("entity_type").parse()?,
        entity_id: parse_uuid(&row.get::<String, _>("entity_id"), "approvals.entity_id")?,
        decision: row.get::<String, _>("decision").parse()?,
        reviewer: row.get("reviewer"),
        note: row.get("note"),
        decided_at: row.get("decided_at"),
    })
}

pub async fn insert_approval(pool: &SqlitePool, approval: &NewApproval) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO approvals (guid, entity_type, entity_id, decision, reviewer, note)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(approval.guid.to_string())
    .bind(approval.entity_type.as_str())
    .bind(approval.entity_id.to_string())
    .bind(approval.decision.as_str())
    .bind(&approval.reviewer)
    .bind(&approval.note)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_approval(pool: &SqlitePool, guid: Uuid) -> Result<Option<Approval>> {
    let row = sqlx::query("SELECT * FROM approvals WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(approval_from_row).transpose()
}

/// Decision history for one entity, newest first.
pub async fn list_approvals_for_entity(
    pool: &SqlitePool,
    entity_type: EntityType,
    entity_id: Uuid,
) -> Result<Vec<Approval>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM approvals
        WHERE entity_type = ? AND entity_id = ?
        ORDER BY decided_at DESC, guid
        "#,
    )
    .bind(entity_type.as_str())
    .bind(entity_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(approval_from_row).collect()
}

/// Recent decisions across all entities, newest first.
pub async fn list_recent_approvals(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Approval>> {
    let rows = sqlx::query("SELECT * FROM approvals ORDER BY decided_at DESC, guid LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.iter().map(approval_from_row).collect()
}

pub async fn count_approvals(pool: &SqlitePool) -> Result<i64> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM approvals")
            .fetch_one(pool)
            .await?,
    )
}

//! Recipient queries

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use organlink_common::db::models::EntityStatus;
use organlink_common::matching::{BloodType, RecipientProfile, Urgency};
use organlink_common::Result;

use crate::db::{parse_string_list, parse_uuid, string_list_json};

/// A recipient row.
#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    pub guid: Uuid,
    pub name: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub blood_type: BloodType,
    pub required_organ: String,
    pub urgency_level: i64,
    /// Categorical band derived from urgency_level.
    pub urgency: Urgency,
    pub age: Option<i64>,
    pub medical_history: Vec<String>,
    pub status: EntityStatus,
    pub hospital_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl Recipient {
    /// Scorer input detached from the storage row.
    pub fn profile(&self) -> RecipientProfile {
        RecipientProfile {
            blood_type: self.blood_type,
            required_organ: self.required_organ.clone(),
            age: self.age,
            urgency_level: self.urgency_level,
            medical_history: self.medical_history.clone(),
        }
    }
}

/// Fields for a new registration.
#[derive(Debug, Clone)]
pub struct NewRecipient {
    pub guid: Uuid,
    pub name: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub blood_type: BloodType,
    pub required_organ: String,
    pub urgency_level: i64,
    pub age: Option<i64>,
    pub medical_history: Vec<String>,
    pub hospital_id: Option<Uuid>,
}

/// Optional list filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct RecipientFilter {
    pub status: Option<EntityStatus>,
    pub blood_type: Option<BloodType>,
    pub organ: Option<String>,
}

fn filter_clauses(filter: &RecipientFilter) -> (String, Vec<String>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        binds.push(status.as_str().to_string());
    }
    if let Some(blood_type) = filter.blood_type {
        clauses.push("blood_type = ?");
        binds.push(blood_type.as_str().to_string());
    }
    if let Some(organ) = &filter.organ {
        clauses.push("lower(trim(required_organ)) = ?");
        binds.push(organ.trim().to_ascii_lowercase());
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, binds)
}

fn recipient_from_row(row: &SqliteRow) -> Result<Recipient> {
    let hospital_id = row
        .get::<Option<String>, _>("hospital_id")
        .map(|raw| parse_uuid(&raw, "recipients.hospital_id"))
        .transpose()?;
    let urgency_level: i64 = row.get("urgency_level");

    Ok(Recipient {
        guid: parse_uuid(&row.get::<String, _>("guid"), "recipients.guid")?,
        name: row.get("name"),
        contact_email: row.get("contact_email"),
        phone: row.get("phone"),
        city: row.get("city"),
        blood_type: row.get::<String, _>("blood_type").parse()?,
        required_organ: row.get("required_organ"),
        urgency_level,
        urgency: Urgency::from_level(urgency_level),
        age: row.get("age"),
        medical_history: parse_string_list(
            &row.get::<String, _>("medical_history"),
            "recipients.medical_history",
        )?,
        status: row.get::<String, _>("status").parse()?,
        hospital_id,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a new recipient with status pending.
pub async fn insert_recipient(pool: &SqlitePool, recipient: &NewRecipient) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipients (guid, name, contact_email, phone, city, blood_type,
                                required_organ, urgency_level, age, medical_history, hospital_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(recipient.guid.to_string())
    .bind(&recipient.name)
    .bind(&recipient.contact_email)
    .bind(&recipient.phone)
    .bind(&recipient.city)
    .bind(recipient.blood_type.as_str())
    .bind(&recipient.required_organ)
    .bind(recipient.urgency_level)
    .bind(recipient.age)
    .bind(string_list_json(&recipient.medical_history)?)
    .bind(recipient.hospital_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_recipient(pool: &SqlitePool, guid: Uuid) -> Result<Option<Recipient>> {
    let row = sqlx::query("SELECT * FROM recipients WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(recipient_from_row).transpose()
}

pub async fn list_recipients(
    pool: &SqlitePool,
    filter: &RecipientFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Recipient>> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!(
        "SELECT * FROM recipients{} ORDER BY urgency_level DESC, created_at LIMIT ? OFFSET ?",
        where_sql
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(recipient_from_row).collect()
}

pub async fn count_recipients(pool: &SqlitePool, filter: &RecipientFilter) -> Result<i64> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!("SELECT COUNT(*) FROM recipients{}", where_sql);

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_one(pool).await?)
}

/// Set the review status. Returns false when the recipient does not exist.
pub async fn update_recipient_status(
    pool: &SqlitePool,
    guid: Uuid,
    status: EntityStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE recipients SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn status_counts(pool: &SqlitePool) -> Result<crate::db::StatusCounts> {
    crate::db::entity_status_counts(pool, "recipients").await
}

/// Approved recipient count per blood type, for the blood-type dashboard.
pub async fn approved_counts_by_blood_type(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query(
        "SELECT blood_type, COUNT(*) AS n FROM recipients WHERE status = 'approved' GROUP BY blood_type",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("blood_type"), row.get::<i64, _>("n")))
        .collect())
}

/// Approved recipient count per required organ (lowercased), for the
/// demand dashboard.
pub async fn approved_counts_by_organ(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query(
        r#"
        SELECT lower(trim(required_organ)) AS organ, COUNT(*) AS n
        FROM recipients WHERE status = 'approved'
        GROUP BY lower(trim(required_organ))
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("organ"), row.get::<i64, _>("n")))
        .collect())
}

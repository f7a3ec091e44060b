//! Doctor queries

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use organlink_common::db::models::EntityStatus;
use organlink_common::Result;

use crate::db::parse_uuid;

/// A doctor row. Doctors always belong to a hospital.
#[derive(Debug, Clone, Serialize)]
pub struct Doctor {
    pub guid: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub license_number: String,
    pub contact_email: String,
    pub hospital_id: Uuid,
    pub status: EntityStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for a new registration.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub guid: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub license_number: String,
    pub contact_email: String,
    pub hospital_id: Uuid,
}

/// Optional list filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    pub status: Option<EntityStatus>,
    pub hospital_id: Option<Uuid>,
}

fn filter_clauses(filter: &DoctorFilter) -> (String, Vec<String>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        binds.push(status.as_str().to_string());
    }
    if let Some(hospital_id) = filter.hospital_id {
        clauses.push("hospital_id = ?");
        binds.push(hospital_id.to_string());
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, binds)
}

fn doctor_from_row(row: &SqliteRow) -> Result<Doctor> {
    Ok(Doctor {
        guid: parse_uuid(&row.get::<String, _>("guid"), "doctors.guid")?,
        name: row.get("name"),
        specialty: row.get("specialty"),
        license_number: row.get("license_number"),
        contact_email: row.get("contact_email"),
        hospital_id: parse_uuid(&row.get::<String, _>("hospital_id"), "doctors.hospital_id")?,
        status: row.get::<String, _>("status").parse()?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a new doctor with status pending.
///
/// license_number is UNIQUE; violations surface as `sqlx::Error::Database`
/// for the caller to map.
pub async fn insert_doctor(pool: &SqlitePool, doctor: &NewDoctor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO doctors (guid, name, specialty, license_number, contact_email, hospital_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(doctor.guid.to_string())
    .bind(&doctor.name)
    .bind(&doctor.specialty)
    .bind(&doctor.license_number)
    .bind(&doctor.contact_email)
    .bind(doctor.hospital_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_doctor(pool: &SqlitePool, guid: Uuid) -> Result<Option<Doctor>> {
    let row = sqlx::query("SELECT * FROM doctors WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(doctor_from_row).transpose()
}

pub async fn list_doctors(
    pool: &SqlitePool,
    filter: &DoctorFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Doctor>> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!(
        "SELECT * FROM doctors{} ORDER BY created_at DESC, guid LIMIT ? OFFSET ?",
        where_sql
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(doctor_from_row).collect()
}

pub async fn count_doctors(pool: &SqlitePool, filter: &DoctorFilter) -> Result<i64> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!("SELECT COUNT(*) FROM doctors{}", where_sql);

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_one(pool).await?)
}

/// Set the review status. Returns false when the doctor does not exist.
pub async fn update_doctor_status(
    pool: &SqlitePool,
    guid: Uuid,
    status: EntityStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE doctors SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn status_counts(pool: &SqlitePool) -> Result<crate::db::StatusCounts> {
    crate::db::entity_status_counts(pool, "doctors").await
}

//! Hospital queries

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use organlink_common::db::models::EntityStatus;
use organlink_common::Result;

use crate::db::parse_uuid;

/// A hospital row. The verification fields record the simulated ledger
/// transaction written when the hospital is approved.
#[derive(Debug, Clone, Serialize)]
pub struct Hospital {
    pub guid: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub contact_email: String,
    pub license_number: String,
    pub status: EntityStatus,
    pub ledger_verified: bool,
    pub verification_tx: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for a new registration.
#[derive(Debug, Clone)]
pub struct NewHospital {
    pub guid: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub contact_email: String,
    pub license_number: String,
}

fn hospital_from_row(row: &SqliteRow) -> Result<Hospital> {
    Ok(Hospital {
        guid: parse_uuid(&row.get::<String, _>("guid"), "hospitals.guid")?,
        name: row.get("name"),
        city: row.get("city"),
        contact_email: row.get("contact_email"),
        license_number: row.get("license_number"),
        status: row.get::<String, _>("status").parse()?,
        ledger_verified: row.get::<i64, _>("ledger_verified") != 0,
        verification_tx: row.get("verification_tx"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a new hospital with status pending.
///
/// contact_email and license_number carry UNIQUE constraints; violations
/// surface as `sqlx::Error::Database` for the caller to map.
pub async fn insert_hospital(pool: &SqlitePool, hospital: &NewHospital) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO hospitals (guid, name, city, contact_email, license_number)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(hospital.guid.to_string())
    .bind(&hospital.name)
    .bind(&hospital.city)
    .bind(&hospital.contact_email)
    .bind(&hospital.license_number)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_hospital(pool: &SqlitePool, guid: Uuid) -> Result<Option<Hospital>> {
    let row = sqlx::query("SELECT * FROM hospitals WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(hospital_from_row).transpose()
}

pub async fn list_hospitals(
    pool: &SqlitePool,
    status: Option<EntityStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Hospital>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(
                "SELECT * FROM hospitals WHERE status = ? ORDER BY created_at DESC, guid LIMIT ? OFFSET ?",
            )
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT * FROM hospitals ORDER BY created_at DESC, guid LIMIT ? OFFSET ?")
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(hospital_from_row).collect()
}

pub async fn count_hospitals(pool: &SqlitePool, status: Option<EntityStatus>) -> Result<i64> {
    let count = match status {
        Some(status) => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM hospitals WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM hospitals")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}

/// Set the review status. Returns false when the hospital does not exist.
pub async fn update_hospital_status(
    pool: &SqlitePool,
    guid: Uuid,
    status: EntityStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE hospitals SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark the hospital ledger-verified and store the transaction hash.
pub async fn set_hospital_verification(pool: &SqlitePool, guid: Uuid, tx_hash: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE hospitals
        SET ledger_verified = 1, verification_tx = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(tx_hash)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn status_counts(pool: &SqlitePool) -> Result<crate::db::StatusCounts> {
    crate::db::entity_status_counts(pool, "hospitals").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        organlink_common::db::init::create_hospitals_table(&pool)
            .await
            .unwrap();
        pool
    }

    fn sample_hospital() -> NewHospital {
        NewHospital {
            guid: Uuid::new_v4(),
            name: "Apollo General".to_string(),
            city: Some("Chennai".to_string()),
            contact_email: "admin@apollo.example.com".to_string(),
            license_number: "HOSP-2024-001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_hospital() {
        let pool = setup_test_db().await;
        let new = sample_hospital();
        insert_hospital(&pool, &new).await.unwrap();

        let hospital = load_hospital(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(hospital.name, "Apollo General");
        assert_eq!(hospital.status, EntityStatus::Pending);
        assert!(!hospital.ledger_verified);
        assert!(hospital.verification_tx.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_license_rejected() {
        let pool = setup_test_db().await;
        let first = sample_hospital();
        insert_hospital(&pool, &first).await.unwrap();

        let mut second = sample_hospital();
        second.guid = Uuid::new_v4();
        second.contact_email = "other@apollo.example.com".to_string();
        // Same license_number violates the UNIQUE constraint.
        let result = insert_hospital(&pool, &second).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_verification_marks_hospital() {
        let pool = setup_test_db().await;
        let new = sample_hospital();
        insert_hospital(&pool, &new).await.unwrap();

        update_hospital_status(&pool, new.guid, EntityStatus::Approved)
            .await
            .unwrap();
        set_hospital_verification(&pool, new.guid, "0xdeadbeef")
            .await
            .unwrap();

        let hospital = load_hospital(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(hospital.status, EntityStatus::Approved);
        assert!(hospital.ledger_verified);
        assert_eq!(hospital.verification_tx.as_deref(), Some("0xdeadbeef"));
    }

    #[tokio::test]
    async fn test_list_and_count_by_status() {
        let pool = setup_test_db().await;
        let first = sample_hospital();
        insert_hospital(&pool, &first).await.unwrap();

        let mut second = sample_hospital();
        second.guid = Uuid::new_v4();
        second.contact_email = "second@example.com".to_string();
        second.license_number = "HOSP-2024-002".to_string();
        insert_hospital(&pool, &second).await.unwrap();

        update_hospital_status(&pool, first.guid, EntityStatus::Approved)
            .await
            .unwrap();

        assert_eq!(count_hospitals(&pool, None).await.unwrap(), 2);
        assert_eq!(
            count_hospitals(&pool, Some(EntityStatus::Pending))
                .await
                .unwrap(),
            1
        );
        let pending = list_hospitals(&pool, Some(EntityStatus::Pending), 100, 0)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].guid, second.guid);
    }
}

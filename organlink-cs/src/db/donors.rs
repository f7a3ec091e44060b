//! Donor queries

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use organlink_common::db::models::EntityStatus;
use organlink_common::matching::{BloodType, DonorProfile};
use organlink_common::Result;

use crate::db::{parse_string_list, parse_uuid, string_list_json};

/// A donor row.
#[derive(Debug, Clone, Serialize)]
pub struct Donor {
    pub guid: Uuid,
    pub name: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub blood_type: BloodType,
    pub organs: Vec<String>,
    pub age: Option<i64>,
    pub medical_history: Vec<String>,
    pub available: bool,
    pub status: EntityStatus,
    pub hospital_id: Option<Uuid>,
    pub badge_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Donor {
    /// Scorer input detached from the storage row.
    pub fn profile(&self) -> DonorProfile {
        DonorProfile {
            blood_type: self.blood_type,
            organs: self.organs.clone(),
            age: self.age,
            medical_history: self.medical_history.clone(),
            available: self.available,
        }
    }
}

/// Fields for a new registration. Status starts at pending and the badge
/// token is only set on approval.
#[derive(Debug, Clone)]
pub struct NewDonor {
    pub guid: Uuid,
    pub name: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub blood_type: BloodType,
    pub organs: Vec<String>,
    pub age: Option<i64>,
    pub medical_history: Vec<String>,
    pub available: bool,
    pub hospital_id: Option<Uuid>,
}

/// Optional list filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct DonorFilter {
    pub status: Option<EntityStatus>,
    pub blood_type: Option<BloodType>,
    pub organ: Option<String>,
    pub available: Option<bool>,
}

fn filter_clauses(filter: &DonorFilter) -> (String, Vec<String>) {
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
        // organs is JSON array text; compare elements case-insensitively
        clauses.push("EXISTS (SELECT 1 FROM json_each(organs) WHERE lower(trim(json_each.value)) = ?)");
        binds.push(organ.trim().to_ascii_lowercase());
    }
    match filter.available {
        Some(true) => clauses.push("available = 1"),
        Some(false) => clauses.push("available = 0"),
        None => {}
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, binds)
}

fn donor_from_row(row: &SqliteRow) -> Result<Donor> {
    let hospital_id = row
        .get::<Option<String>, _>("hospital_id")
        .map(|raw| parse_uuid(&raw, "donors.hospital_id"))
        .transpose()?;

    Ok(Donor {
        guid: parse_uuid(&row.get::<String, _>("guid"), "donors.guid")?,
        name: row.get("name"),
        contact_email: row.get("contact_email"),
        phone: row.get("phone"),
        city: row.get("city"),
        blood_type: row.get::<String, _>("blood_type").parse()?,
        organs: parse_string_list(&row.get::<String, _>("organs"), "donors.organs")?,
        age: row.get("age"),
        medical_history: parse_string_list(
            &row.get::<String, _>("medical_history"),
            "donors.medical_history",
        )?,
        available: row.get::<i64, _>("available") != 0,
        status: row.get::<String, _>("status").parse()?,
        hospital_id,
        badge_token: row.get("badge_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a new donor with status pending.
pub async fn insert_donor(pool: &SqlitePool, donor: &NewDonor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO donors (guid, name, contact_email, phone, city, blood_type,
                            organs, age, medical_history, available, hospital_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(donor.guid.to_string())
    .bind(&donor.name)
    .bind(&donor.contact_email)
    .bind(&donor.phone)
    .bind(&donor.city)
    .bind(donor.blood_type.as_str())
    .bind(string_list_json(&donor.organs)?)
    .bind(donor.age)
    .bind(string_list_json(&donor.medical_history)?)
    .bind(donor.available as i64)
    .bind(donor.hospital_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_donor(pool: &SqlitePool, guid: Uuid) -> Result<Option<Donor>> {
    let row = sqlx::query("SELECT * FROM donors WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(donor_from_row).transpose()
}

pub async fn list_donors(
    pool: &SqlitePool,
    filter: &DonorFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Donor>> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!(
        "SELECT * FROM donors{} ORDER BY created_at DESC, guid LIMIT ? OFFSET ?",
        where_sql
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(donor_from_row).collect()
}

pub async fn count_donors(pool: &SqlitePool, filter: &DonorFilter) -> Result<i64> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!("SELECT COUNT(*) FROM donors{}", where_sql);

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_one(pool).await?)
}

/// Set the review status. Returns false when the donor does not exist.
pub async fn update_donor_status(
    pool: &SqlitePool,
    guid: Uuid,
    status: EntityStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE donors SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Toggle availability. Returns false when the donor does not exist.
pub async fn update_donor_availability(
    pool: &SqlitePool,
    guid: Uuid,
    available: bool,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE donors SET available = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(available as i64)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Store the badge token minted on approval.
pub async fn set_badge_token(pool: &SqlitePool, guid: Uuid, token: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE donors SET badge_token = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(token)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Donors the matching pass considers: approved and currently available.
pub async fn list_match_candidates(pool: &SqlitePool) -> Result<Vec<Donor>> {
    let rows = sqlx::query(
        "SELECT * FROM donors WHERE status = 'approved' AND available = 1 ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(donor_from_row).collect()
}

pub async fn status_counts(pool: &SqlitePool) -> Result<crate::db::StatusCounts> {
    crate::db::entity_status_counts(pool, "donors").await
}

/// Approved donor count per blood type, for the blood-type dashboard.
pub async fn approved_counts_by_blood_type(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query(
        "SELECT blood_type, COUNT(*) AS n FROM donors WHERE status = 'approved' GROUP BY blood_type",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("blood_type"), row.get::<i64, _>("n")))
        .collect())
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
        organlink_common::db::init::create_donors_table(&pool)
            .await
            .unwrap();
        pool
    }

    fn sample_donor() -> NewDonor {
        NewDonor {
            guid: Uuid::new_v4(),
            name: "Ravi Kumar".to_string(),
            contact_email: "ravi@example.com".to_string(),
            phone: Some("555-0100".to_string()),
            city: Some("Chennai".to_string()),
            blood_type: BloodType::ONeg,
            organs: vec!["Kidney".to_string(), "Liver".to_string()],
            age: Some(30),
            medical_history: vec![],
            available: true,
            hospital_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_donor() {
        let pool = setup_test_db().await;
        let new = sample_donor();
        insert_donor(&pool, &new).await.unwrap();

        let donor = load_donor(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(donor.guid, new.guid);
        assert_eq!(donor.name, "Ravi Kumar");
        assert_eq!(donor.blood_type, BloodType::ONeg);
        assert_eq!(donor.organs, vec!["Kidney", "Liver"]);
        assert_eq!(donor.status, EntityStatus::Pending);
        assert!(donor.available);
        assert!(donor.badge_token.is_none());
        assert!(!donor.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_donor() {
        let pool = setup_test_db().await;
        let donor = load_donor(&pool, Uuid::new_v4()).await.unwrap();
        assert!(donor.is_none());
    }

    #[tokio::test]
    async fn test_list_donors_filters_by_status_and_organ() {
        let pool = setup_test_db().await;

        let mut kidney = sample_donor();
        kidney.organs = vec!["Kidney".to_string()];
        insert_donor(&pool, &kidney).await.unwrap();

        let mut liver = sample_donor();
        liver.guid = Uuid::new_v4();
        liver.organs = vec!["Liver".to_string()];
        insert_donor(&pool, &liver).await.unwrap();

        update_donor_status(&pool, kidney.guid, EntityStatus::Approved)
            .await
            .unwrap();

        let filter = DonorFilter {
            status: Some(EntityStatus::Approved),
            ..Default::default()
        };
        let approved = list_donors(&pool, &filter, 100, 0).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].guid, kidney.guid);

        // Organ filter matches case-insensitively against the JSON array.
        let filter = DonorFilter {
            organ: Some(" kidney ".to_string()),
            ..Default::default()
        };
        let kidneys = list_donors(&pool, &filter, 100, 0).await.unwrap();
        assert_eq!(kidneys.len(), 1);
        assert_eq!(kidneys[0].guid, kidney.guid);
        assert_eq!(count_donors(&pool, &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_status_and_badge() {
        let pool = setup_test_db().await;
        let new = sample_donor();
        insert_donor(&pool, &new).await.unwrap();

        assert!(update_donor_status(&pool, new.guid, EntityStatus::Approved)
            .await
            .unwrap());
        assert!(set_badge_token(&pool, new.guid, "0xabc123").await.unwrap());

        let donor = load_donor(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(donor.status, EntityStatus::Approved);
        assert_eq!(donor.badge_token.as_deref(), Some("0xabc123"));

        // Unknown guid reports no rows touched.
        assert!(
            !update_donor_status(&pool, Uuid::new_v4(), EntityStatus::Approved)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_availability_toggle_and_candidates() {
        let pool = setup_test_db().await;
        let new = sample_donor();
        insert_donor(&pool, &new).await.unwrap();
        update_donor_status(&pool, new.guid, EntityStatus::Approved)
            .await
            .unwrap();

        assert_eq!(list_match_candidates(&pool).await.unwrap().len(), 1);

        assert!(update_donor_availability(&pool, new.guid, false)
            .await
            .unwrap());
        assert!(list_match_candidates(&pool).await.unwrap().is_empty());

        let donor = load_donor(&pool, new.guid).await.unwrap().unwrap();
        assert!(!donor.available);
    }

    #[tokio::test]
    async fn test_donor_profile_projection() {
        let pool = setup_test_db().await;
        let mut new = sample_donor();
        new.medical_history = vec!["Diabetes".to_string()];
        insert_donor(&pool, &new).await.unwrap();

        let donor = load_donor(&pool, new.guid).await.unwrap().unwrap();
        let profile = donor.profile();
        assert_eq!(profile.blood_type, BloodType::ONeg);
        assert!(profile.offers_organ("kidney"));
        assert_eq!(profile.medical_history, vec!["Diabetes"]);
        assert!(profile.available);
    }
}

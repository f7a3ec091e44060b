//! Match queries
//!
//! A match row is one proposed donor/recipient/organ pairing with its
//! scoring outcome, the oracle's second opinion, and the ledger
//! transaction hash once recorded.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use organlink_common::db::models::MatchStatus;
use organlink_common::matching::BloodRelation;
use organlink_common::Result;

use crate::db::{parse_string_list, parse_uuid, string_list_json};

/// A match row.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub guid: Uuid,
    pub donor_id: Uuid,
    pub recipient_id: Uuid,
    pub organ: String,
    pub score: i64,
    pub blood_relation: BloodRelation,
    pub reasons: Vec<String>,
    pub predicted_success: String,
    pub predicted_complications: String,
    pub recommendation: String,
    pub oracle_score: Option<i64>,
    pub status: MatchStatus,
    pub tx_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub decided_at: Option<String>,
}

/// Fields the matching pass persists for a new pending match.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub guid: Uuid,
    pub donor_id: Uuid,
    pub recipient_id: Uuid,
    pub organ: String,
    pub score: i64,
    pub blood_relation: BloodRelation,
    pub reasons: Vec<String>,
    pub predicted_success: String,
    pub predicted_complications: String,
    pub recommendation: String,
    pub oracle_score: Option<i64>,
}

/// Optional list filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub status: Option<MatchStatus>,
    pub recipient_id: Option<Uuid>,
    pub donor_id: Option<Uuid>,
}

fn filter_clauses(filter: &MatchFilter) -> (String, Vec<String>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        binds.push(status.as_str().to_string());
    }
    if let Some(recipient_id) = filter.recipient_id {
        clauses.push("recipient_id = ?");
        binds.push(recipient_id.to_string());
    }
    if let Some(donor_id) = filter.donor_id {
        clauses.push("donor_id = ?");
        binds.push(donor_id.to_string());
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, binds)
}

fn match_from_row(row: &SqliteRow) -> Result<MatchRecord> {
    Ok(MatchRecord {
        guid: parse_uuid(&row.get::<String, _>("guid"), "matches.guid")?,
        donor_id: parse_uuid(&row.get::<String, _>("donor_id"), "matches.donor_id")?,
        recipient_id: parse_uuid(
            &row.get::<String, _>("recipient_id"),
            "matches.recipient_id",
        )?,
        organ: row.get("organ"),
        score: row.get("score"),
        blood_relation: row.get::<String, _>("blood_relation").parse()?,
        reasons: parse_string_list(&row.get::<String, _>("reasons"), "matches.reasons")?,
        predicted_success: row.get("predicted_success"),
        predicted_complications: row.get("predicted_complications"),
        recommendation: row.get("recommendation"),
        oracle_score: row.get("oracle_score"),
        status: row.get::<String, _>("status").parse()?,
        tx_hash: row.get("tx_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        decided_at: row.get("decided_at"),
    })
}

/// Insert a new match with status pending.
pub async fn insert_match(pool: &SqlitePool, new_match: &NewMatch) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO matches (guid, donor_id, recipient_id, organ, score, blood_relation,
                             reasons, predicted_success, predicted_complications,
                             recommendation, oracle_score)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_match.guid.to_string())
    .bind(new_match.donor_id.to_string())
    .bind(new_match.recipient_id.to_string())
    .bind(&new_match.organ)
    .bind(new_match.score)
    .bind(new_match.blood_relation.as_str())
    .bind(string_list_json(&new_match.reasons)?)
    .bind(&new_match.predicted_success)
    .bind(&new_match.predicted_complications)
    .bind(&new_match.recommendation)
    .bind(new_match.oracle_score)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_match(pool: &SqlitePool, guid: Uuid) -> Result<Option<MatchRecord>> {
    let row = sqlx::query("SELECT * FROM matches WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(match_from_row).transpose()
}

pub async fn list_matches(
    pool: &SqlitePool,
    filter: &MatchFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<MatchRecord>> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!(
        "SELECT * FROM matches{} ORDER BY score DESC, created_at DESC, guid LIMIT ? OFFSET ?",
        where_sql
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(match_from_row).collect()
}

pub async fn count_matches(pool: &SqlitePool, filter: &MatchFilter) -> Result<i64> {
    let (where_sql, binds) = filter_clauses(filter);
    let sql = format!("SELECT COUNT(*) FROM matches{}", where_sql);

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_one(pool).await?)
}

/// Whether a pending match already exists for this donor/recipient/organ
/// triple. The matching pass uses this to avoid duplicate proposals.
pub async fn pending_pair_exists(
    pool: &SqlitePool,
    donor_id: Uuid,
    recipient_id: Uuid,
    organ: &str,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM matches
            WHERE donor_id = ? AND recipient_id = ?
              AND lower(trim(organ)) = ? AND status = 'pending'
        )
        "#,
    )
    .bind(donor_id.to_string())
    .bind(recipient_id.to_string())
    .bind(organ.trim().to_ascii_lowercase())
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Move a pending match to completed or rejected, stamping decided_at.
///
/// The status guard is in the WHERE clause so two concurrent decisions
/// cannot both succeed. Returns false when the match is missing or not
/// pending; the caller distinguishes by loading first.
pub async fn decide_match(pool: &SqlitePool, guid: Uuid, status: MatchStatus) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE matches
        SET status = ?, decided_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ? AND status = 'pending'
        "#,
    )
    .bind(status.as_str())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Store the ledger transaction hash for a match.
pub async fn set_match_tx_hash(pool: &SqlitePool, guid: Uuid, tx_hash: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE matches SET tx_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(tx_hash)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// A match joined with the donor and recipient names, for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct RecentMatch {
    pub guid: Uuid,
    pub donor_id: Uuid,
    pub donor_name: String,
    pub recipient_id: Uuid,
    pub recipient_name: String,
    pub organ: String,
    pub score: i64,
    pub oracle_score: Option<i64>,
    pub status: MatchStatus,
    pub created_at: String,
}

/// Latest matches with names, newest first.
pub async fn list_recent_matches(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<RecentMatch>> {
    let rows = sqlx::query(
        r#"
        SELECT m.guid, m.donor_id, d.name AS donor_name,
               m.recipient_id, r.name AS recipient_name,
               m.organ, m.score, m.oracle_score, m.status, m.created_at
        FROM matches m
        JOIN donors d ON d.guid = m.donor_id
        JOIN recipients r ON r.guid = m.recipient_id
        ORDER BY m.created_at DESC, m.guid
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(RecentMatch {
                guid: parse_uuid(&row.get::<String, _>("guid"), "matches.guid")?,
                donor_id: parse_uuid(&row.get::<String, _>("donor_id"), "matches.donor_id")?,
                donor_name: row.get("donor_name"),
                recipient_id: parse_uuid(
                    &row.get::<String, _>("recipient_id"),
                    "matches.recipient_id",
                )?,
                recipient_name: row.get("recipient_name"),
                organ: row.get("organ"),
                score: row.get("score"),
                oracle_score: row.get("oracle_score"),
                status: row.get::<String, _>("status").parse()?,
                created_at: row.get("created_at"),
            })
        })
        .collect::<Result<Vec<_>>>()
}

/// Pending/completed/rejected tallies across all matches.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MatchCounts {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    pub rejected: i64,
}

pub async fn match_status_counts(pool: &SqlitePool) -> Result<MatchCounts> {
    let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM matches GROUP BY status")
        .fetch_all(pool)
        .await?;

    let mut counts = MatchCounts::default();
    for row in &rows {
        let status: String = row.get("status");
        let n: i64 = row.get("n");
        counts.total += n;
        match status.as_str() {
            "pending" => counts.pending = n,
            "completed" => counts.completed = n,
            "rejected" => counts.rejected = n,
            _ => {}
        }
    }
    Ok(counts)
}

/// Pending match count per organ (lowercased), for the demand dashboard.
pub async fn pending_match_counts_by_organ(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query(
        r#"
        SELECT lower(trim(organ)) AS organ, COUNT(*) AS n
        FROM matches WHERE status = 'pending'
        GROUP BY lower(trim(organ))
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("organ"), row.get::<i64, _>("n")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::donors::{insert_donor, NewDonor};
    use crate::db::recipients::{insert_recipient, NewRecipient};
    use organlink_common::matching::BloodType;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> (SqlitePool, Uuid, Uuid) {
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
        organlink_common::db::init::create_recipients_table(&pool)
            .await
            .unwrap();
        organlink_common::db::init::create_matches_table(&pool)
            .await
            .unwrap();

        let donor = NewDonor {
            guid: Uuid::new_v4(),
            name: "Donor".to_string(),
            contact_email: "d@example.com".to_string(),
            phone: None,
            city: None,
            blood_type: BloodType::ONeg,
            organs: vec!["Kidney".to_string()],
            age: Some(30),
            medical_history: vec![],
            available: true,
            hospital_id: None,
        };
        insert_donor(&pool, &donor).await.unwrap();

        let recipient = NewRecipient {
            guid: Uuid::new_v4(),
            name: "Recipient".to_string(),
            contact_email: "r@example.com".to_string(),
            phone: None,
            city: None,
            blood_type: BloodType::ABPos,
            required_organ: "Kidney".to_string(),
            urgency_level: 9,
            age: Some(32),
            medical_history: vec![],
            hospital_id: None,
        };
        insert_recipient(&pool, &recipient).await.unwrap();

        (pool, donor.guid, recipient.guid)
    }

    fn sample_match(donor_id: Uuid, recipient_id: Uuid) -> NewMatch {
        NewMatch {
            guid: Uuid::new_v4(),
            donor_id,
            recipient_id,
            organ: "Kidney".to_string(),
            score: 90,
            blood_relation: BloodRelation::Compatible,
            reasons: vec!["Compatible blood type (O- donor to AB+ recipient)".to_string()],
            predicted_success: "Very High (>95%)".to_string(),
            predicted_complications: "Minimal".to_string(),
            recommendation: "Highly recommended".to_string(),
            oracle_score: Some(74),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_match() {
        let (pool, donor_id, recipient_id) = setup_test_db().await;
        let new = sample_match(donor_id, recipient_id);
        insert_match(&pool, &new).await.unwrap();

        let m = load_match(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(m.score, 90);
        assert_eq!(m.blood_relation, BloodRelation::Compatible);
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.oracle_score, Some(74));
        assert_eq!(m.predicted_success, "Very High (>95%)");
        assert!(m.tx_hash.is_none());
        assert!(m.decided_at.is_none());
    }

    #[tokio::test]
    async fn test_pending_pair_exists_is_organ_case_insensitive() {
        let (pool, donor_id, recipient_id) = setup_test_db().await;
        assert!(!pending_pair_exists(&pool, donor_id, recipient_id, "Kidney")
            .await
            .unwrap());

        insert_match(&pool, &sample_match(donor_id, recipient_id))
            .await
            .unwrap();

        assert!(pending_pair_exists(&pool, donor_id, recipient_id, "kidney ")
            .await
            .unwrap());
        assert!(!pending_pair_exists(&pool, donor_id, recipient_id, "Liver")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_decide_match_only_moves_pending() {
        let (pool, donor_id, recipient_id) = setup_test_db().await;
        let new = sample_match(donor_id, recipient_id);
        insert_match(&pool, &new).await.unwrap();

        assert!(decide_match(&pool, new.guid, MatchStatus::Completed)
            .await
            .unwrap());
        let m = load_match(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Completed);
        assert!(m.decided_at.is_some());

        // Second decision finds no pending row.
        assert!(!decide_match(&pool, new.guid, MatchStatus::Rejected)
            .await
            .unwrap());
        let m = load_match(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Completed);
    }

    #[tokio::test]
    async fn test_tx_hash_stored() {
        let (pool, donor_id, recipient_id) = setup_test_db().await;
        let new = sample_match(donor_id, recipient_id);
        insert_match(&pool, &new).await.unwrap();

        let tx = format!("0x{}", "ab".repeat(32));
        assert!(set_match_tx_hash(&pool, new.guid, &tx).await.unwrap());
        let m = load_match(&pool, new.guid).await.unwrap().unwrap();
        assert_eq!(m.tx_hash.as_deref(), Some(tx.as_str()));
    }

    #[tokio::test]
    async fn test_list_orders_by_score() {
        let (pool, donor_id, recipient_id) = setup_test_db().await;

        let mut low = sample_match(donor_id, recipient_id);
        low.score = 62;
        low.organ = "Liver".to_string();
        insert_match(&pool, &low).await.unwrap();

        let mut high = sample_match(donor_id, recipient_id);
        high.guid = Uuid::new_v4();
        high.score = 95;
        insert_match(&pool, &high).await.unwrap();

        let all = list_matches(&pool, &MatchFilter::default(), 100, 0)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].guid, high.guid);

        let filter = MatchFilter {
            recipient_id: Some(recipient_id),
            status: Some(MatchStatus::Pending),
            ..Default::default()
        };
        assert_eq!(count_matches(&pool, &filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_recent_matches_join_names() {
        let (pool, donor_id, recipient_id) = setup_test_db().await;
        insert_match(&pool, &sample_match(donor_id, recipient_id))
            .await
            .unwrap();

        let recent = list_recent_matches(&pool, 10, 0).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].donor_name, "Donor");
        assert_eq!(recent[0].recipient_name, "Recipient");
    }

    #[tokio::test]
    async fn test_pending_counts_by_organ() {
        let (pool, donor_id, recipient_id) = setup_test_db().await;
        insert_match(&pool, &sample_match(donor_id, recipient_id))
            .await
            .unwrap();
        let mut second = sample_match(donor_id, recipient_id);
        second.guid = Uuid::new_v4();
        second.organ = " KIDNEY".to_string();
        insert_match(&pool, &second).await.unwrap();

        let counts = pending_match_counts_by_organ(&pool).await.unwrap();
        assert_eq!(counts, vec![("kidney".to_string(), 2)]);
    }
}

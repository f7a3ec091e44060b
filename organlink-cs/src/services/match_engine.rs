//! The matching pass
//!
//! Loads the approved, available donor pool, applies the eligibility
//! pre-filter against one recipient, scores survivors under the
//! configured model, persists new pending matches (skipping triples
//! already pending), annotates each with the oracle's second opinion and
//! emits `MatchProposed` events.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use organlink_common::db::models::{EntityStatus, MatchStatus};
use organlink_common::events::{EventBus, OrganLinkEvent};
use organlink_common::matching::{check_eligibility, score_pair, ScoringModel};
use organlink_common::Result;

use crate::db;
use crate::db::matches::{MatchFilter, MatchRecord, NewMatch};
use crate::services::oracle::ScoreOracle;

/// What one pass did, plus the recipient's pending matches afterwards
/// ranked by score descending.
#[derive(Debug, Serialize)]
pub struct MatchingPassOutcome {
    pub recipient_id: Uuid,
    pub scoring_model: ScoringModel,
    /// Matches persisted by this pass.
    pub created: usize,
    /// Eligible pairs skipped because a pending match already existed.
    pub skipped_existing: usize,
    pub matches: Vec<MatchRecord>,
}

impl MatchingPassOutcome {
    fn empty(recipient_id: Uuid, scoring_model: ScoringModel) -> Self {
        MatchingPassOutcome {
            recipient_id,
            scoring_model,
            created: 0,
            skipped_existing: 0,
            matches: Vec::new(),
        }
    }
}

/// Run the matching pass for one recipient.
///
/// A missing or unapproved recipient yields an empty outcome rather than
/// an error.
pub async fn run_matching_pass(
    pool: &SqlitePool,
    bus: &EventBus,
    recipient_id: Uuid,
) -> Result<MatchingPassOutcome> {
    let policy = db::settings::get_matching_policy(pool).await?;

    let recipient = match db::recipients::load_recipient(pool, recipient_id).await? {
        Some(recipient) => recipient,
        None => {
            debug!("Matching pass for unknown recipient {}", recipient_id);
            return Ok(MatchingPassOutcome::empty(recipient_id, policy.model));
        }
    };
    if recipient.status != EntityStatus::Approved {
        debug!(
            "Matching pass for {} recipient {}, returning empty",
            recipient.status, recipient_id
        );
        return Ok(MatchingPassOutcome::empty(recipient_id, policy.model));
    }

    let oracle = ScoreOracle::from_settings(pool).await?;
    let candidates = db::donors::list_match_candidates(pool).await?;
    let recipient_profile = recipient.profile();

    let mut created = 0usize;
    let mut skipped_existing = 0usize;

    for donor in &candidates {
        let donor_profile = donor.profile();
        if let Err(exclusion) = check_eligibility(&donor_profile, &recipient_profile, &policy) {
            debug!("Donor {} excluded: {}", donor.guid, exclusion);
            continue;
        }

        if db::matches::pending_pair_exists(
            pool,
            donor.guid,
            recipient.guid,
            &recipient.required_organ,
        )
        .await?
        {
            skipped_existing += 1;
            continue;
        }

        let report = score_pair(&donor_profile, &recipient_profile, policy.model);
        let oracle_score = oracle.second_opinion().await;

        let new_match = NewMatch {
            guid: Uuid::new_v4(),
            donor_id: donor.guid,
            recipient_id: recipient.guid,
            organ: recipient.required_organ.clone(),
            score: report.score as i64,
            blood_relation: report.blood_relation,
            reasons: report.reasons,
            predicted_success: report.band.predicted_success().to_string(),
            predicted_complications: report.band.predicted_complications().to_string(),
            recommendation: report.band.recommendation().to_string(),
            oracle_score: Some(oracle_score),
        };
        db::matches::insert_match(pool, &new_match).await?;
        created += 1;

        bus.emit_lossy(OrganLinkEvent::MatchProposed {
            match_id: new_match.guid,
            donor_id: donor.guid,
            recipient_id: recipient.guid,
            organ: new_match.organ.clone(),
            score: new_match.score,
            timestamp: chrono::Utc::now(),
        });
    }

    // Negative LIMIT disables the limit in SQLite
    let filter = MatchFilter {
        status: Some(MatchStatus::Pending),
        recipient_id: Some(recipient.guid),
        ..Default::default()
    };
    let matches = db::matches::list_matches(pool, &filter, -1, 0).await?;

    info!(
        "Matching pass for recipient {}: {} considered, {} created, {} already pending",
        recipient.guid,
        candidates.len(),
        created,
        skipped_existing
    );

    Ok(MatchingPassOutcome {
        recipient_id: recipient.guid,
        scoring_model: policy.model,
        created,
        skipped_existing,
        matches,
    })
}

//! Match preview, matching pass, lifecycle and ledger endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use organlink_common::db::models::MatchStatus;
use organlink_common::events::OrganLinkEvent;
use organlink_common::matching::{check_eligibility, score_pair};

use crate::api::default_page;
use crate::db;
use crate::db::matches::{MatchFilter, MatchRecord};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::services::ledger::{LedgerClient, LedgerError};
use crate::services::match_engine::{run_matching_pass, MatchingPassOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub donor_id: Uuid,
    pub recipient_id: Uuid,
}

/// GET /api/matches/preview
///
/// Scores one donor/recipient pair without persisting anything. An
/// ineligible pair answers 400 with the exclusion reason.
pub async fn preview_match(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let donor = db::donors::load_donor(&state.db, query.donor_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Donor {} not found", query.donor_id)))?;
    let recipient = db::recipients::load_recipient(&state.db, query.recipient_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Recipient {} not found", query.recipient_id))
        })?;

    let policy = db::settings::get_matching_policy(&state.db).await?;
    let donor_profile = donor.profile();
    let recipient_profile = recipient.profile();

    if let Err(exclusion) = check_eligibility(&donor_profile, &recipient_profile, &policy) {
        return Err(ApiError::BadRequest(format!(
            "Pair is ineligible: {}",
            exclusion
        )));
    }

    let report = score_pair(&donor_profile, &recipient_profile, policy.model);
    Ok(Json(json!({
        "donor_id": donor.guid,
        "recipient_id": recipient.guid,
        "organ": recipient.required_organ,
        "scoring_model": policy.model.as_str(),
        "score": report.score,
        "blood_relation": report.blood_relation,
        "reasons": report.reasons,
        "predicted_success": report.band.predicted_success(),
        "predicted_complications": report.band.predicted_complications(),
        "recommendation": report.band.recommendation(),
    })))
}

/// POST /api/recipients/:id/matches
///
/// Runs the matching pass for one recipient. A missing or unapproved
/// recipient yields an empty outcome rather than an error.
pub async fn find_matches(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MatchingPassOutcome>> {
    let outcome = run_matching_pass(&state.db, &state.event_bus, id).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct MatchListQuery {
    pub status: Option<String>,
    pub recipient_id: Option<Uuid>,
    pub donor_id: Option<Uuid>,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub matches: Vec<MatchRecord>,
}

/// GET /api/matches
pub async fn list_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchListQuery>,
) -> ApiResult<Json<MatchListResponse>> {
    let filter = MatchFilter {
        status: query
            .status
            .as_deref()
            .map(|raw| raw.parse::<MatchStatus>())
            .transpose()?,
        recipient_id: query.recipient_id,
        donor_id: query.donor_id,
    };

    let total_results = db::matches::count_matches(&state.db, &filter).await?;
    let pagination = calculate_pagination(total_results, query.page);
    let matches = db::matches::list_matches(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(MatchListResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        matches,
    }))
}

/// GET /api/matches/:id
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MatchRecord>> {
    let record = db::matches::load_match(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Match {} not found", id)))?;
    Ok(Json(record))
}

async fn decide(state: &AppState, id: Uuid, status: MatchStatus) -> ApiResult<Json<MatchRecord>> {
    let record = db::matches::load_match(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Match {} not found", id)))?;
    if record.status != MatchStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Match {} is already {}",
            id, record.status
        )));
    }

    // The guarded UPDATE loses to a concurrent decision.
    if !db::matches::decide_match(&state.db, id, status).await? {
        return Err(ApiError::Conflict(format!(
            "Match {} is no longer pending",
            id
        )));
    }

    let decided = db::matches::load_match(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal("Match missing after update".to_string()))?;

    let timestamp = chrono::Utc::now();
    let event = match status {
        MatchStatus::Completed => OrganLinkEvent::MatchCompleted {
            match_id: id,
            timestamp,
        },
        _ => OrganLinkEvent::MatchRejected {
            match_id: id,
            timestamp,
        },
    };
    state.event_bus.emit_lossy(event);

    info!("Match {} marked {}", id, status);
    Ok(Json(decided))
}

/// POST /api/matches/:id/complete
pub async fn complete_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MatchRecord>> {
    decide(&state, id, MatchStatus::Completed).await
}

/// POST /api/matches/:id/reject
pub async fn reject_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MatchRecord>> {
    decide(&state, id, MatchStatus::Rejected).await
}

/// POST /api/matches/:id/record
///
/// Writes the match to the ledger and stores the transaction hash.
/// Recording twice answers 409; a gateway failure answers 502 and leaves
/// the match untouched.
pub async fn record_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MatchRecord>> {
    let record = db::matches::load_match(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Match {} not found", id)))?;
    if let Some(tx_hash) = &record.tx_hash {
        return Err(ApiError::Conflict(format!(
            "Match {} is already recorded: {}",
            id, tx_hash
        )));
    }

    let ledger = LedgerClient::from_settings(&state.db).await?;
    let tx_hash = match ledger.record_match(&record).await {
        Ok(tx_hash) => tx_hash,
        Err(LedgerError::Gateway(msg)) => return Err(ApiError::BadGateway(msg)),
    };

    db::matches::set_match_tx_hash(&state.db, id, &tx_hash).await?;
    let recorded = db::matches::load_match(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal("Match missing after update".to_string()))?;

    state.event_bus.emit_lossy(OrganLinkEvent::LedgerRecorded {
        match_id: id,
        tx_hash: tx_hash.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!("Match {} recorded on ledger: {}", id, tx_hash);
    Ok(Json(recorded))
}

//! Admin endpoints: pending queue, approval decisions, fraud stubs, settings
//!
//! Everything here sits behind the shared-secret auth middleware.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use organlink_common::db::models::{Decision, EntityStatus, EntityType};
use organlink_common::events::OrganLinkEvent;
use organlink_common::matching::ScoringModel;

use crate::api::{validate, PageQuery};
use crate::db;
use crate::db::approvals::{Approval, NewApproval};
use crate::db::doctors::{Doctor, DoctorFilter};
use crate::db::donors::{Donor, DonorFilter};
use crate::db::hospitals::Hospital;
use crate::db::recipients::{Recipient, RecipientFilter};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::services::ledger::LedgerClient;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PendingQueue {
    pub donors: Vec<Donor>,
    pub recipients: Vec<Recipient>,
    pub hospitals: Vec<Hospital>,
    pub doctors: Vec<Doctor>,
}

/// GET /api/admin/pending
///
/// The full review queue, grouped by entity type. Queues are worked down
/// promptly, so this endpoint is not paginated; negative LIMIT disables
/// the limit in SQLite.
pub async fn pending_queue(State(state): State<AppState>) -> ApiResult<Json<PendingQueue>> {
    let donor_filter = DonorFilter {
        status: Some(EntityStatus::Pending),
        ..Default::default()
    };
    let recipient_filter = RecipientFilter {
        status: Some(EntityStatus::Pending),
        ..Default::default()
    };
    let doctor_filter = DoctorFilter {
        status: Some(EntityStatus::Pending),
        ..Default::default()
    };

    Ok(Json(PendingQueue {
        donors: db::donors::list_donors(&state.db, &donor_filter, -1, 0).await?,
        recipients: db::recipients::list_recipients(&state.db, &recipient_filter, -1, 0).await?,
        hospitals: db::hospitals::list_hospitals(&state.db, Some(EntityStatus::Pending), -1, 0)
            .await?,
        doctors: db::doctors::list_doctors(&state.db, &doctor_filter, -1, 0).await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub decision: String,
    pub reviewer: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Current review status of an entity, or None when it does not exist.
async fn entity_status(
    state: &AppState,
    entity_type: EntityType,
    entity_id: Uuid,
) -> ApiResult<Option<EntityStatus>> {
    let status = match entity_type {
        EntityType::Donor => db::donors::load_donor(&state.db, entity_id)
            .await?
            .map(|d| d.status),
        EntityType::Recipient => db::recipients::load_recipient(&state.db, entity_id)
            .await?
            .map(|r| r.status),
        EntityType::Hospital => db::hospitals::load_hospital(&state.db, entity_id)
            .await?
            .map(|h| h.status),
        EntityType::Doctor => db::doctors::load_doctor(&state.db, entity_id)
            .await?
            .map(|d| d.status),
    };
    Ok(status)
}

async fn set_entity_status(
    state: &AppState,
    entity_type: EntityType,
    entity_id: Uuid,
    status: EntityStatus,
) -> ApiResult<bool> {
    let updated = match entity_type {
        EntityType::Donor => db::donors::update_donor_status(&state.db, entity_id, status).await?,
        EntityType::Recipient => {
            db::recipients::update_recipient_status(&state.db, entity_id, status).await?
        }
        EntityType::Hospital => {
            db::hospitals::update_hospital_status(&state.db, entity_id, status).await?
        }
        EntityType::Doctor => {
            db::doctors::update_doctor_status(&state.db, entity_id, status).await?
        }
    };
    Ok(updated)
}

/// POST /api/admin/approvals
///
/// Records the decision in the audit trail, moves the entity out of
/// pending, and runs the ledger side effects: hospital approval writes a
/// verification transaction, donor approval mints a badge token.
pub async fn decide_approval(
    State(state): State<AppState>,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<Json<Approval>> {
    let entity_type: EntityType = req.entity_type.parse()?;
    let decision: Decision = req.decision.parse()?;
    let reviewer = validate::require_non_empty("reviewer", &req.reviewer)?;
    let note = validate::optional_trimmed(req.note);

    let current = entity_status(&state, entity_type, req.entity_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("{} {} not found", entity_type, req.entity_id))
        })?;
    if current != EntityStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "{} {} is already {}",
            entity_type, req.entity_id, current
        )));
    }

    set_entity_status(&state, entity_type, req.entity_id, decision.entity_status()).await?;

    if decision == Decision::Approved {
        match entity_type {
            EntityType::Hospital => {
                let ledger = LedgerClient::from_settings(&state.db).await?;
                let tx_hash = ledger.verify_hospital(req.entity_id).await;
                db::hospitals::set_hospital_verification(&state.db, req.entity_id, &tx_hash)
                    .await?;
                info!("Hospital {} verified on ledger: {}", req.entity_id, tx_hash);
            }
            EntityType::Donor => {
                let ledger = LedgerClient::from_settings(&state.db).await?;
                let badge = ledger.mint_badge(req.entity_id).await;
                db::donors::set_badge_token(&state.db, req.entity_id, &badge).await?;
                info!("Donor {} badge minted: {}", req.entity_id, badge);
            }
            EntityType::Recipient | EntityType::Doctor => {}
        }
    }

    let approval = NewApproval {
        guid: Uuid::new_v4(),
        entity_type,
        entity_id: req.entity_id,
        decision,
        reviewer,
        note,
    };
    db::approvals::insert_approval(&state.db, &approval).await?;

    let recorded = db::approvals::load_approval(&state.db, approval.guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Approval missing after insert".to_string()))?;

    state.event_bus.emit_lossy(OrganLinkEvent::ApprovalDecided {
        entity_type: entity_type.to_string(),
        entity_id: req.entity_id,
        decision: decision.to_string(),
        reviewer: recorded.reviewer.clone(),
        timestamp: chrono::Utc::now(),
    });

    info!(
        "{} {} {} by {}",
        entity_type, req.entity_id, decision, recorded.reviewer
    );
    Ok(Json(recorded))
}

#[derive(Debug, Serialize)]
pub struct ApprovalListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub approvals: Vec<Approval>,
}

/// GET /api/admin/approvals
pub async fn list_approvals(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ApprovalListResponse>> {
    let total_results = db::approvals::count_approvals(&state.db).await?;
    let pagination = calculate_pagination(total_results, query.page);
    let approvals =
        db::approvals::list_recent_approvals(&state.db, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(ApprovalListResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        approvals,
    }))
}

/// GET /api/admin/fraud-score/:entity_type/:id
pub async fn fraud_score(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    let entity_type: EntityType = entity_type.parse()?;
    if entity_status(&state, entity_type, entity_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "{} {} not found",
            entity_type, entity_id
        )));
    }

    let ledger = LedgerClient::from_settings(&state.db).await?;
    let score = ledger.fraud_score(entity_type, entity_id).await;

    Ok(Json(json!({
        "entity_type": entity_type,
        "entity_id": entity_id,
        "fraud_score": score,
    })))
}

#[derive(Debug, Deserialize)]
pub struct FraudReportRequest {
    pub entity_type: String,
    pub entity_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /api/admin/fraud-report
///
/// Files a fraud report against an entity on the ledger. The entity's
/// status is not changed; revoking it is a separate approval decision.
pub async fn report_fraud(
    State(state): State<AppState>,
    Json(req): Json<FraudReportRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let entity_type: EntityType = req.entity_type.parse()?;
    if entity_status(&state, entity_type, req.entity_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "{} {} not found",
            entity_type, req.entity_id
        )));
    }

    let ledger = LedgerClient::from_settings(&state.db).await?;
    let tx_hash = ledger.report_fraud(entity_type, req.entity_id).await;

    warn!(
        "Fraud report filed against {} {} ({}): {}",
        entity_type,
        req.entity_id,
        req.reason.as_deref().unwrap_or("no reason given"),
        tx_hash
    );

    Ok(Json(json!({
        "entity_type": entity_type,
        "entity_id": req.entity_id,
        "tx_hash": tx_hash,
    })))
}

/// GET /api/admin/settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let policy = db::settings::get_matching_policy(&state.db).await?;
    let oracle_delay_ms = db::settings::get_oracle_delay_ms(&state.db).await?;
    let oracle_seeded = db::settings::get_oracle_seed(&state.db).await?.is_some();
    let ledger_delay_ms = db::settings::get_ledger_delay_ms(&state.db).await?;
    let ledger_gateway_url = db::settings::get_ledger_gateway_url(&state.db).await?;

    Ok(Json(json!({
        "scoring_model": policy.model.as_str(),
        "max_age_gap_years": policy.max_age_gap_years,
        "oracle_delay_ms": oracle_delay_ms,
        "oracle_seeded": oracle_seeded,
        "ledger_delay_ms": ledger_delay_ms,
        "ledger_gateway_url": ledger_gateway_url,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ScoringModelRequest {
    pub model: String,
}

/// POST /api/admin/settings/scoring-model
pub async fn set_scoring_model(
    State(state): State<AppState>,
    Json(req): Json<ScoringModelRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let model: ScoringModel = req.model.parse()?;
    db::settings::set_scoring_model(&state.db, model).await?;

    info!("Scoring model set to {}", model);
    Ok(Json(json!({ "scoring_model": model.as_str() })))
}

//! Donor registration and lookup endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use organlink_common::db::models::EntityStatus;
use organlink_common::events::OrganLinkEvent;
use organlink_common::matching::BloodType;

use crate::api::{default_page, validate};
use crate::db;
use crate::db::donors::{Donor, DonorFilter, NewDonor};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::services::ledger::LedgerClient;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterDonorRequest {
    pub name: String,
    pub contact_email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    pub blood_type: String,
    pub organs: Vec<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub hospital_id: Option<Uuid>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct DonorListQuery {
    pub status: Option<String>,
    pub blood_type: Option<String>,
    pub organ: Option<String>,
    pub available: Option<bool>,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Serialize)]
pub struct DonorListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub donors: Vec<Donor>,
}

/// POST /api/donors
///
/// Registers a donor with status pending and logs the registration to
/// the ledger in the background.
pub async fn register_donor(
    State(state): State<AppState>,
    Json(req): Json<RegisterDonorRequest>,
) -> ApiResult<(StatusCode, Json<Donor>)> {
    let name = validate::require_non_empty("name", &req.name)?;
    let contact_email = validate::require_non_empty("contact_email", &req.contact_email)?;
    let blood_type: BloodType = req.blood_type.parse()?;
    let organs = validate::require_organs(req.organs)?;
    let age = validate::validate_age(req.age)?;
    let medical_history = validate::clean_string_list(req.medical_history);

    if let Some(hospital_id) = req.hospital_id {
        if db::hospitals::load_hospital(&state.db, hospital_id)
            .await?
            .is_none()
        {
            return Err(ApiError::NotFound(format!(
                "Hospital {} not found",
                hospital_id
            )));
        }
    }

    let donor = NewDonor {
        guid: Uuid::new_v4(),
        name,
        contact_email,
        phone: validate::optional_trimmed(req.phone),
        city: validate::optional_trimmed(req.city),
        blood_type,
        organs,
        age,
        medical_history,
        available: req.available,
        hospital_id: req.hospital_id,
    };
    db::donors::insert_donor(&state.db, &donor).await?;

    let created = db::donors::load_donor(&state.db, donor.guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Donor missing after insert".to_string()))?;

    state.event_bus.emit_lossy(OrganLinkEvent::DonorRegistered {
        donor_id: created.guid,
        blood_type: created.blood_type.to_string(),
        organs: created.organs.clone(),
        timestamp: chrono::Utc::now(),
    });

    // Ledger registration is fire-and-forget; the row never waits on it.
    let pool = state.db.clone();
    let donor_id = created.guid;
    tokio::spawn(async move {
        match LedgerClient::from_settings(&pool).await {
            Ok(ledger) => {
                let tx_hash = ledger.register_donor(donor_id).await;
                info!("Donor {} registration logged to ledger: {}", donor_id, tx_hash);
            }
            Err(e) => warn!("Skipping ledger registration for donor {}: {}", donor_id, e),
        }
    });

    info!(
        "Donor {} registered ({}, {:?})",
        created.guid, created.blood_type, created.organs
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/donors
pub async fn list_donors(
    State(state): State<AppState>,
    Query(query): Query<DonorListQuery>,
) -> ApiResult<Json<DonorListResponse>> {
    let filter = DonorFilter {
        status: query
            .status
            .as_deref()
            .map(|raw| raw.parse::<EntityStatus>())
            .transpose()?,
        blood_type: query
            .blood_type
            .as_deref()
            .map(|raw| raw.parse::<BloodType>())
            .transpose()?,
        organ: validate::optional_trimmed(query.organ),
        available: query.available,
    };

    let total_results = db::donors::count_donors(&state.db, &filter).await?;
    let pagination = calculate_pagination(total_results, query.page);
    let donors = db::donors::list_donors(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(DonorListResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        donors,
    }))
}

/// GET /api/donors/:id
pub async fn get_donor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Donor>> {
    let donor = db::donors::load_donor(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Donor {} not found", id)))?;
    Ok(Json(donor))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

/// PUT /api/donors/:id/availability
pub async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AvailabilityRequest>,
) -> ApiResult<Json<Donor>> {
    let updated = db::donors::update_donor_availability(&state.db, id, req.available).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("Donor {} not found", id)));
    }

    let donor = db::donors::load_donor(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal("Donor missing after update".to_string()))?;

    state
        .event_bus
        .emit_lossy(OrganLinkEvent::DonorAvailabilityChanged {
            donor_id: id,
            available: req.available,
            timestamp: chrono::Utc::now(),
        });

    info!("Donor {} availability set to {}", id, req.available);
    Ok(Json(donor))
}

//! Hospital registration and lookup endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use organlink_common::db::models::EntityStatus;
use organlink_common::events::OrganLinkEvent;

use crate::api::{default_page, is_unique_violation, validate};
use crate::db;
use crate::db::hospitals::{Hospital, NewHospital};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterHospitalRequest {
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    pub contact_email: String,
    pub license_number: String,
}

#[derive(Debug, Deserialize)]
pub struct HospitalListQuery {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Serialize)]
pub struct HospitalListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub hospitals: Vec<Hospital>,
}

/// POST /api/hospitals
///
/// Duplicate contact_email or license_number answers 409.
pub async fn register_hospital(
    State(state): State<AppState>,
    Json(req): Json<RegisterHospitalRequest>,
) -> ApiResult<(StatusCode, Json<Hospital>)> {
    let hospital = NewHospital {
        guid: Uuid::new_v4(),
        name: validate::require_non_empty("name", &req.name)?,
        city: validate::optional_trimmed(req.city),
        contact_email: validate::require_non_empty("contact_email", &req.contact_email)?,
        license_number: validate::require_non_empty("license_number", &req.license_number)?,
    };

    if let Err(e) = db::hospitals::insert_hospital(&state.db, &hospital).await {
        if is_unique_violation(&e) {
            return Err(ApiError::Conflict(
                "A hospital with this contact_email or license_number already exists".to_string(),
            ));
        }
        return Err(e.into());
    }

    let created = db::hospitals::load_hospital(&state.db, hospital.guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Hospital missing after insert".to_string()))?;

    state
        .event_bus
        .emit_lossy(OrganLinkEvent::HospitalRegistered {
            hospital_id: created.guid,
            name: created.name.clone(),
            timestamp: chrono::Utc::now(),
        });

    info!("Hospital {} registered ({})", created.guid, created.name);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/hospitals
pub async fn list_hospitals(
    State(state): State<AppState>,
    Query(query): Query<HospitalListQuery>,
) -> ApiResult<Json<HospitalListResponse>> {
    let status = query
        .status
        .as_deref()
        .map(|raw| raw.parse::<EntityStatus>())
        .transpose()?;

    let total_results = db::hospitals::count_hospitals(&state.db, status).await?;
    let pagination = calculate_pagination(total_results, query.page);
    let hospitals =
        db::hospitals::list_hospitals(&state.db, status, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(HospitalListResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        hospitals,
    }))
}

/// GET /api/hospitals/:id
pub async fn get_hospital(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Hospital>> {
    let hospital = db::hospitals::load_hospital(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Hospital {} not found", id)))?;
    Ok(Json(hospital))
}

//! Doctor registration and lookup endpoints
//!
//! Doctors register under a hospital; the hospital must already be
//! approved before its doctors can enroll.

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
use crate::db::doctors::{Doctor, DoctorFilter, NewDoctor};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterDoctorRequest {
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    pub license_number: String,
    pub contact_email: String,
    pub hospital_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DoctorListQuery {
    pub status: Option<String>,
    pub hospital_id: Option<Uuid>,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Serialize)]
pub struct DoctorListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub doctors: Vec<Doctor>,
}

/// POST /api/doctors
pub async fn register_doctor(
    State(state): State<AppState>,
    Json(req): Json<RegisterDoctorRequest>,
) -> ApiResult<(StatusCode, Json<Doctor>)> {
    let name = validate::require_non_empty("name", &req.name)?;
    let license_number = validate::require_non_empty("license_number", &req.license_number)?;
    let contact_email = validate::require_non_empty("contact_email", &req.contact_email)?;

    let hospital = db::hospitals::load_hospital(&state.db, req.hospital_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Hospital {} not found", req.hospital_id)))?;
    if hospital.status != EntityStatus::Approved {
        return Err(ApiError::Conflict(format!(
            "Hospital {} is not approved (status: {})",
            hospital.guid, hospital.status
        )));
    }

    let doctor = NewDoctor {
        guid: Uuid::new_v4(),
        name,
        specialty: validate::optional_trimmed(req.specialty),
        license_number,
        contact_email,
        hospital_id: req.hospital_id,
    };

    if let Err(e) = db::doctors::insert_doctor(&state.db, &doctor).await {
        if is_unique_violation(&e) {
            return Err(ApiError::Conflict(
                "A doctor with this license_number already exists".to_string(),
            ));
        }
        return Err(e.into());
    }

    let created = db::doctors::load_doctor(&state.db, doctor.guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Doctor missing after insert".to_string()))?;

    state.event_bus.emit_lossy(OrganLinkEvent::DoctorRegistered {
        doctor_id: created.guid,
        hospital_id: created.hospital_id,
        timestamp: chrono::Utc::now(),
    });

    info!(
        "Doctor {} registered under hospital {}",
        created.guid, created.hospital_id
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/doctors
pub async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<DoctorListQuery>,
) -> ApiResult<Json<DoctorListResponse>> {
    let filter = DoctorFilter {
        status: query
            .status
            .as_deref()
            .map(|raw| raw.parse::<EntityStatus>())
            .transpose()?,
        hospital_id: query.hospital_id,
    };

    let total_results = db::doctors::count_doctors(&state.db, &filter).await?;
    let pagination = calculate_pagination(total_results, query.page);
    let doctors = db::doctors::list_doctors(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(DoctorListResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        doctors,
    }))
}

/// GET /api/doctors/:id
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Doctor>> {
    let doctor = db::doctors::load_doctor(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Doctor {} not found", id)))?;
    Ok(Json(doctor))
}

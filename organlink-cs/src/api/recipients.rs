//! Recipient registration and lookup endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use organlink_common::db::models::EntityStatus;
use organlink_common::events::OrganLinkEvent;
use organlink_common::matching::BloodType;

use crate::api::{default_page, validate};
use crate::db;
use crate::db::recipients::{NewRecipient, Recipient, RecipientFilter};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRecipientRequest {
    pub name: String,
    pub contact_email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    pub blood_type: String,
    pub required_organ: String,
    /// Numeric 1-10 scale; takes precedence over `urgency` when both appear.
    #[serde(default)]
    pub urgency_level: Option<i64>,
    /// Categorical fallback (low/medium/high/critical).
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub hospital_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RecipientListQuery {
    pub status: Option<String>,
    pub blood_type: Option<String>,
    pub organ: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Serialize)]
pub struct RecipientListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub recipients: Vec<Recipient>,
}

/// POST /api/recipients
pub async fn register_recipient(
    State(state): State<AppState>,
    Json(req): Json<RegisterRecipientRequest>,
) -> ApiResult<(StatusCode, Json<Recipient>)> {
    let name = validate::require_non_empty("name", &req.name)?;
    let contact_email = validate::require_non_empty("contact_email", &req.contact_email)?;
    let blood_type: BloodType = req.blood_type.parse()?;
    let required_organ = validate::require_non_empty("required_organ", &req.required_organ)?;
    let urgency_level = validate::resolve_urgency(req.urgency_level, req.urgency)?;
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

    let recipient = NewRecipient {
        guid: Uuid::new_v4(),
        name,
        contact_email,
        phone: validate::optional_trimmed(req.phone),
        city: validate::optional_trimmed(req.city),
        blood_type,
        required_organ,
        urgency_level,
        age,
        medical_history,
        hospital_id: req.hospital_id,
    };
    db::recipients::insert_recipient(&state.db, &recipient).await?;

    let created = db::recipients::load_recipient(&state.db, recipient.guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Recipient missing after insert".to_string()))?;

    state
        .event_bus
        .emit_lossy(OrganLinkEvent::RecipientRegistered {
            recipient_id: created.guid,
            blood_type: created.blood_type.to_string(),
            required_organ: created.required_organ.clone(),
            urgency_level: created.urgency_level,
            timestamp: chrono::Utc::now(),
        });

    info!(
        "Recipient {} registered ({}, {}, urgency {})",
        created.guid, created.blood_type, created.required_organ, created.urgency_level
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/recipients
pub async fn list_recipients(
    State(state): State<AppState>,
    Query(query): Query<RecipientListQuery>,
) -> ApiResult<Json<RecipientListResponse>> {
    let filter = RecipientFilter {
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
    };

    let total_results = db::recipients::count_recipients(&state.db, &filter).await?;
    let pagination = calculate_pagination(total_results, query.page);
    let recipients =
        db::recipients::list_recipients(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(RecipientListResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        recipients,
    }))
}

/// GET /api/recipients/:id
pub async fn get_recipient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Recipient>> {
    let recipient = db::recipients::load_recipient(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Recipient {} not found", id)))?;
    Ok(Json(recipient))
}

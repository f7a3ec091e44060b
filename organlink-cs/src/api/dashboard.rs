//! Aggregate dashboard endpoints
//!
//! Read-only JSON views over the registry: entity and match tallies,
//! per-organ supply and demand, blood-type distribution, and the latest
//! matches. All are public; none mutate state.

use std::collections::{BTreeSet, HashMap, HashSet};

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use organlink_common::db::models::EntityStatus;
use organlink_common::matching::BloodType;

use crate::api::PageQuery;
use crate::db;
use crate::db::donors::DonorFilter;
use crate::db::matches::{MatchCounts, MatchFilter, RecentMatch};
use crate::db::StatusCounts;
use crate::error::ApiResult;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Overview {
    pub donors: StatusCounts,
    pub recipients: StatusCounts,
    pub hospitals: StatusCounts,
    pub doctors: StatusCounts,
    pub matches: MatchCounts,
    /// Approved donors whose availability flag is currently set.
    pub available_donors: i64,
}

/// GET /api/dashboard/overview
pub async fn overview(State(state): State<AppState>) -> ApiResult<Json<Overview>> {
    let available_filter = DonorFilter {
        status: Some(EntityStatus::Approved),
        available: Some(true),
        ..Default::default()
    };

    Ok(Json(Overview {
        donors: db::donors::status_counts(&state.db).await?,
        recipients: db::recipients::status_counts(&state.db).await?,
        hospitals: db::hospitals::status_counts(&state.db).await?,
        doctors: db::doctors::status_counts(&state.db).await?,
        matches: db::matches::match_status_counts(&state.db).await?,
        available_donors: db::donors::count_donors(&state.db, &available_filter).await?,
    }))
}

#[derive(Debug, Serialize)]
pub struct OrganDemand {
    pub organ: String,
    pub available_donors: i64,
    pub waiting_recipients: i64,
    pub pending_matches: i64,
}

fn title_case(organ: &str) -> String {
    let mut chars = organ.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// GET /api/dashboard/organ-demand
///
/// Supply and demand per organ, highest demand first. Organ names are
/// matched case-insensitively; each donor counts once per organ no
/// matter how their pledge list is written.
pub async fn organ_demand(State(state): State<AppState>) -> ApiResult<Json<Vec<OrganDemand>>> {
    let candidates = db::donors::list_match_candidates(&state.db).await?;

    let mut donor_counts: HashMap<String, i64> = HashMap::new();
    let mut display: HashMap<String, String> = HashMap::new();
    for donor in &candidates {
        let mut seen: HashSet<String> = HashSet::new();
        for organ in &donor.organs {
            let key = organ.trim().to_ascii_lowercase();
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            *donor_counts.entry(key.clone()).or_insert(0) += 1;
            display.entry(key).or_insert_with(|| organ.trim().to_string());
        }
    }

    let recipient_counts: HashMap<String, i64> = db::recipients::approved_counts_by_organ(&state.db)
        .await?
        .into_iter()
        .collect();
    let pending_counts: HashMap<String, i64> = db::matches::pending_match_counts_by_organ(&state.db)
        .await?
        .into_iter()
        .collect();

    let mut keys: BTreeSet<String> = donor_counts.keys().cloned().collect();
    keys.extend(recipient_counts.keys().cloned());
    keys.extend(pending_counts.keys().cloned());

    let mut demand: Vec<OrganDemand> = keys
        .into_iter()
        .map(|key| OrganDemand {
            organ: display
                .get(&key)
                .cloned()
                .unwrap_or_else(|| title_case(&key)),
            available_donors: donor_counts.get(&key).copied().unwrap_or(0),
            waiting_recipients: recipient_counts.get(&key).copied().unwrap_or(0),
            pending_matches: pending_counts.get(&key).copied().unwrap_or(0),
        })
        .collect();
    demand.sort_by(|a, b| {
        b.waiting_recipients
            .cmp(&a.waiting_recipients)
            .then_with(|| a.organ.cmp(&b.organ))
    });

    Ok(Json(demand))
}

#[derive(Debug, Serialize)]
pub struct BloodTypeCount {
    pub blood_type: BloodType,
    pub donors: i64,
    pub recipients: i64,
}

/// GET /api/dashboard/blood-types
///
/// Approved donor/recipient distribution over all eight blood types, in
/// antigen order, zero-filled.
pub async fn blood_types(State(state): State<AppState>) -> ApiResult<Json<Vec<BloodTypeCount>>> {
    let donor_counts: HashMap<String, i64> = db::donors::approved_counts_by_blood_type(&state.db)
        .await?
        .into_iter()
        .collect();
    let recipient_counts: HashMap<String, i64> =
        db::recipients::approved_counts_by_blood_type(&state.db)
            .await?
            .into_iter()
            .collect();

    let distribution = BloodType::ALL
        .iter()
        .map(|blood_type| BloodTypeCount {
            blood_type: *blood_type,
            donors: donor_counts.get(blood_type.as_str()).copied().unwrap_or(0),
            recipients: recipient_counts
                .get(blood_type.as_str())
                .copied()
                .unwrap_or(0),
        })
        .collect();

    Ok(Json(distribution))
}

#[derive(Debug, Serialize)]
pub struct RecentMatchesResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub matches: Vec<RecentMatch>,
}

/// GET /api/dashboard/recent-matches
pub async fn recent_matches(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<RecentMatchesResponse>> {
    let total_results = db::matches::count_matches(&state.db, &MatchFilter::default()).await?;
    let pagination = calculate_pagination(total_results, query.page);
    let matches = db::matches::list_recent_matches(&state.db, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(RecentMatchesResponse {
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        matches,
    }))
}

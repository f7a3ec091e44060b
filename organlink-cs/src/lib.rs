//! organlink-cs library - OrganLink Coordination Server
//!
//! Registration, approval workflow, compatibility matching and the
//! dashboard/SSE surface, served over the shared organlink.db.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use organlink_common::events::EventBus;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// In-process event broadcast feeding the SSE endpoint
    pub event_bus: EventBus,
    /// Shared secret for admin API authentication (0 disables checking)
    pub shared_secret: i64,
    /// Server start time, for the health endpoint
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, event_bus: EventBus, shared_secret: i64) -> Self {
        Self {
            db,
            event_bus,
            shared_secret,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Admin routes sit behind the shared-secret middleware; registration,
/// lookup, matching reads and dashboards are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};
    use tower_http::cors::CorsLayer;

    // Protected routes (require authentication)
    let admin = Router::new()
        .route("/api/admin/pending", get(api::admin::pending_queue))
        .route(
            "/api/admin/approvals",
            get(api::admin::list_approvals).post(api::admin::decide_approval),
        )
        .route(
            "/api/admin/fraud-score/:entity_type/:entity_id",
            get(api::admin::fraud_score),
        )
        .route("/api/admin/fraud-report", post(api::admin::report_fraud))
        .route("/api/admin/settings", get(api::admin::get_settings))
        .route(
            "/api/admin/settings/scoring-model",
            post(api::admin::set_scoring_model),
        )
        .route("/api/matches/:id/complete", post(api::matching::complete_match))
        .route("/api/matches/:id/reject", post(api::matching::reject_match))
        .route("/api/matches/:id/record", post(api::matching::record_match))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/health", get(api::health::health_check))
        .route("/api/buildinfo", get(api::health::get_build_info))
        .route("/api/events", get(api::sse::event_stream))
        .route(
            "/api/donors",
            post(api::donors::register_donor).get(api::donors::list_donors),
        )
        .route("/api/donors/:id", get(api::donors::get_donor))
        .route(
            "/api/donors/:id/availability",
            put(api::donors::set_availability),
        )
        .route(
            "/api/recipients",
            post(api::recipients::register_recipient).get(api::recipients::list_recipients),
        )
        .route("/api/recipients/:id", get(api::recipients::get_recipient))
        .route(
            "/api/recipients/:id/matches",
            post(api::matching::find_matches),
        )
        .route(
            "/api/hospitals",
            post(api::hospitals::register_hospital).get(api::hospitals::list_hospitals),
        )
        .route("/api/hospitals/:id", get(api::hospitals::get_hospital))
        .route(
            "/api/doctors",
            post(api::doctors::register_doctor).get(api::doctors::list_doctors),
        )
        .route("/api/doctors/:id", get(api::doctors::get_doctor))
        .route("/api/matches", get(api::matching::list_matches))
        .route("/api/matches/preview", get(api::matching::preview_match))
        .route("/api/matches/:id", get(api::matching::get_match))
        .route("/api/dashboard/overview", get(api::dashboard::overview))
        .route("/api/dashboard/organ-demand", get(api::dashboard::organ_demand))
        .route("/api/dashboard/blood-types", get(api::dashboard::blood_types))
        .route(
            "/api/dashboard/recent-matches",
            get(api::dashboard::recent_matches),
        );

    // Combine routers
    Router::new()
        .merge(admin)
        .merge(public)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

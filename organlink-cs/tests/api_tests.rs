//! Integration tests for registration, lookup and dashboard endpoints
//!
//! Tests cover:
//! - Health and buildinfo endpoints
//! - Donor/recipient/hospital/doctor registration and validation
//! - List filters and pagination clamping
//! - Donor availability toggle
//! - Dashboard aggregates

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use organlink_common::events::EventBus;
use organlink_cs::{build_router, AppState};

/// Test helper: fresh database in a temp dir, instant deterministic stubs,
/// auth disabled.
async fn setup() -> (axum::Router, SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = organlink_common::db::init::init_database(&dir.path().join("organlink.db"))
        .await
        .expect("Should initialize database");

    organlink_cs::db::settings::set_setting(&pool, "oracle_delay_ms", 0)
        .await
        .unwrap();
    organlink_cs::db::settings::set_setting(&pool, "ledger_delay_ms", 0)
        .await
        .unwrap();
    organlink_cs::db::settings::set_setting(&pool, "oracle_seed", 7)
        .await
        .unwrap();

    let state = AppState::new(pool.clone(), EventBus::new(100), 0);
    (build_router(state), pool, dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn donor_payload() -> Value {
    json!({
        "name": "Arjun Mehta",
        "contact_email": "arjun@example.com",
        "city": "Pune",
        "blood_type": "O-",
        "organs": ["Kidney", "Liver"],
        "age": 34
    })
}

fn recipient_payload() -> Value {
    json!({
        "name": "Meena Iyer",
        "contact_email": "meena@example.com",
        "blood_type": "AB+",
        "required_organ": "Kidney",
        "urgency_level": 9,
        "age": 32
    })
}

async fn register(app: &axum::Router, uri: &str, payload: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", uri, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

// =============================================================================
// Health and buildinfo
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool, _dir) = setup().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "organlink-cs");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let (app, _pool, _dir) = setup().await;

    let response = app.oneshot(get("/api/buildinfo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["version"].is_string());
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].is_string());
    assert!(body["build_profile"].is_string());
}

// =============================================================================
// Donor registration
// =============================================================================

#[tokio::test]
async fn test_register_donor_starts_pending() {
    let (app, _pool, _dir) = setup().await;

    let donor = register(&app, "/api/donors", donor_payload()).await;
    assert_eq!(donor["name"], "Arjun Mehta");
    assert_eq!(donor["blood_type"], "O-");
    assert_eq!(donor["organs"], json!(["Kidney", "Liver"]));
    assert_eq!(donor["status"], "pending");
    assert_eq!(donor["available"], true);
    assert!(donor["badge_token"].is_null());
    assert!(donor["guid"].is_string());

    // Lookup round-trips
    let guid = donor["guid"].as_str().unwrap();
    let response = app
        .oneshot(get(&format!("/api/donors/{}", guid)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["guid"], donor["guid"]);
}

#[tokio::test]
async fn test_register_donor_invalid_blood_type() {
    let (app, _pool, _dir) = setup().await;

    let mut payload = donor_payload();
    payload["blood_type"] = json!("Q+");
    let response = app
        .oneshot(json_request("POST", "/api/donors", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_register_donor_requires_an_organ() {
    let (app, _pool, _dir) = setup().await;

    let mut payload = donor_payload();
    payload["organs"] = json!(["   "]);
    let response = app
        .oneshot(json_request("POST", "/api/donors", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("organs"));
}

#[tokio::test]
async fn test_register_donor_rejects_blank_name_and_bad_age() {
    let (app, _pool, _dir) = setup().await;

    let mut payload = donor_payload();
    payload["name"] = json!("   ");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/donors", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = donor_payload();
    payload["age"] = json!(130);
    let response = app
        .oneshot(json_request("POST", "/api/donors", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_donor_unknown_hospital_is_404() {
    let (app, _pool, _dir) = setup().await;

    let mut payload = donor_payload();
    payload["hospital_id"] = json!("5f0c6b9e-0000-0000-0000-000000000000");
    let response = app
        .oneshot(json_request("POST", "/api/donors", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_donor_unknown_is_404() {
    let (app, _pool, _dir) = setup().await;

    let response = app
        .oneshot(get("/api/donors/5f0c6b9e-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Recipient registration
// =============================================================================

#[tokio::test]
async fn test_register_recipient_with_numeric_urgency() {
    let (app, _pool, _dir) = setup().await;

    let recipient = register(&app, "/api/recipients", recipient_payload()).await;
    assert_eq!(recipient["required_organ"], "Kidney");
    assert_eq!(recipient["urgency_level"], 9);
    assert_eq!(recipient["urgency"], "Critical");
    assert_eq!(recipient["status"], "pending");
}

#[tokio::test]
async fn test_register_recipient_with_categorical_urgency() {
    let (app, _pool, _dir) = setup().await;

    let mut payload = recipient_payload();
    payload.as_object_mut().unwrap().remove("urgency_level");
    payload["urgency"] = json!("high");

    let recipient = register(&app, "/api/recipients", payload).await;
    assert_eq!(recipient["urgency_level"], 8);
}

#[tokio::test]
async fn test_register_recipient_requires_some_urgency() {
    let (app, _pool, _dir) = setup().await;

    let mut payload = recipient_payload();
    payload.as_object_mut().unwrap().remove("urgency_level");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/recipients", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = recipient_payload();
    payload["urgency_level"] = json!(11);
    let response = app
        .oneshot(json_request("POST", "/api/recipients", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Hospital and doctor registration
// =============================================================================

#[tokio::test]
async fn test_register_hospital_duplicate_license_is_409() {
    let (app, _pool, _dir) = setup().await;

    let payload = json!({
        "name": "Apollo General",
        "city": "Chennai",
        "contact_email": "admin@apollo.example.com",
        "license_number": "HOSP-2024-001"
    });
    register(&app, "/api/hospitals", payload.clone()).await;

    let mut dup = payload;
    dup["contact_email"] = json!("other@apollo.example.com");
    let response = app
        .oneshot(json_request("POST", "/api/hospitals", dup))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_doctor_unknown_hospital_is_404() {
    let (app, _pool, _dir) = setup().await;

    let payload = json!({
        "name": "Dr. Rao",
        "specialty": "Nephrology",
        "license_number": "MED-1001",
        "contact_email": "rao@example.com",
        "hospital_id": "5f0c6b9e-0000-0000-0000-000000000000"
    });
    let response = app
        .oneshot(json_request("POST", "/api/doctors", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_doctor_under_pending_hospital_is_409() {
    let (app, _pool, _dir) = setup().await;

    let hospital = register(
        &app,
        "/api/hospitals",
        json!({
            "name": "Fortis",
            "contact_email": "fortis@example.com",
            "license_number": "HOSP-77"
        }),
    )
    .await;

    let payload = json!({
        "name": "Dr. Rao",
        "license_number": "MED-1001",
        "contact_email": "rao@example.com",
        "hospital_id": hospital["guid"]
    });
    let response = app
        .oneshot(json_request("POST", "/api/doctors", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// =============================================================================
// List filters and pagination
// =============================================================================

#[tokio::test]
async fn test_donor_list_filters() {
    let (app, _pool, _dir) = setup().await;

    register(&app, "/api/donors", donor_payload()).await;

    let mut second = donor_payload();
    second["name"] = json!("Kiran Shah");
    second["contact_email"] = json!("kiran@example.com");
    second["blood_type"] = json!("A+");
    second["organs"] = json!(["Liver"]);
    register(&app, "/api/donors", second).await;

    // Blood-type filter
    let response = app
        .clone()
        .oneshot(get("/api/donors?blood_type=O-"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["donors"][0]["name"], "Arjun Mehta");

    // Organ filter is case-insensitive
    let response = app
        .clone()
        .oneshot(get("/api/donors?organ=kidney"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/donors?organ=LIVER"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_results"], 2);

    // Unknown status value is a 400
    let response = app
        .oneshot(get("/api/donors?status=archived"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pagination_clamps_page() {
    let (app, _pool, _dir) = setup().await;

    register(&app, "/api/donors", donor_payload()).await;

    let response = app.oneshot(get("/api/donors?page=99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["page_size"], 100);
    assert_eq!(body["donors"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Donor availability
// =============================================================================

#[tokio::test]
async fn test_donor_availability_toggle() {
    let (app, _pool, _dir) = setup().await;

    let donor = register(&app, "/api/donors", donor_payload()).await;
    let guid = donor["guid"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/donors/{}/availability", guid),
            json!({ "available": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["available"], false);

    // Unknown donor answers 404
    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/donors/5f0c6b9e-0000-0000-0000-000000000000/availability",
            json!({ "available": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Dashboards
// =============================================================================

#[tokio::test]
async fn test_dashboard_overview_counts() {
    let (app, _pool, _dir) = setup().await;

    register(&app, "/api/donors", donor_payload()).await;
    register(&app, "/api/recipients", recipient_payload()).await;

    let response = app.oneshot(get("/api/dashboard/overview")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["donors"]["total"], 1);
    assert_eq!(body["donors"]["pending"], 1);
    assert_eq!(body["donors"]["approved"], 0);
    assert_eq!(body["recipients"]["total"], 1);
    assert_eq!(body["hospitals"]["total"], 0);
    assert_eq!(body["matches"]["total"], 0);
    // Pending donors are not counted as available supply
    assert_eq!(body["available_donors"], 0);
}

#[tokio::test]
async fn test_dashboard_blood_types_zero_filled() {
    let (app, _pool, _dir) = setup().await;

    let response = app.oneshot(get("/api/dashboard/blood-types")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 8);
    for row in rows {
        assert_eq!(row["donors"], 0);
        assert_eq!(row["recipients"], 0);
    }
    assert_eq!(rows[0]["blood_type"], "O-");
}

#[tokio::test]
async fn test_dashboard_organ_demand_empty() {
    let (app, _pool, _dir) = setup().await;

    let response = app.oneshot(get("/api/dashboard/organ-demand")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!([]));
}

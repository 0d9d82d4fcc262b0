use std::sync::Arc;

use axum::http::StatusCode;
use bayline_core::config::TrackerConfig;
use bayline_core::{Bay, Customer, ManualClock, MembershipTier, StaticIdentity};
use bayline_server::{AppState, BayFeed, TrackerService};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bays() -> Vec<Bay> {
    vec![
        Bay {
            id: "bay-1".into(),
            name: "Bay 1".into(),
            location: "north".into(),
            is_available: true,
        },
        Bay {
            id: "bay-2".into(),
            name: "Bay 2".into(),
            location: String::new(),
            is_available: false,
        },
    ]
}

/// Router over a tracker with a frozen clock and a signed-in customer.
fn app() -> (axum::Router, ManualClock, AppState) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
    let identity = StaticIdentity::signed_in(Customer {
        id: "cust-7".into(),
        first_name: "Riley".into(),
        membership_tier: Some(MembershipTier::Premium),
    });
    let service = TrackerService::spawn(
        Arc::new(clock.clone()),
        Arc::new(identity),
        TrackerConfig::default(),
        BayFeed::new(bays()),
    );
    let state = AppState::new(service);
    (bayline_server::build_router(state.clone()), clock, state)
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut req = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            req = req.header("content-type", "application/json");
            axum::body::Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => axum::body::Body::empty(),
    };
    let response = app.oneshot(req.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn post(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, None).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_tracker_is_walk_in() {
    let (app, _clock, _state) = app();
    let (status, json) = get(app, "/api/session").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["session"].is_null());
    assert_eq!(json["booking_state"], "walk_in");
    assert_eq!(json["is_active"], false);
    assert_eq!(json["arming"], "idle");
}

#[tokio::test]
async fn start_session_uses_identity_and_bay() {
    let (app, _clock, _state) = app();
    let (status, json) = post_json(
        app,
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1", "duration_minutes": 90 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking_state"], "currently_playing");
    assert_eq!(json["is_active"], true);
    assert_eq!(json["bay_name"], "Bay 1");
    assert_eq!(json["time_remaining"], "1h 30m");
    assert_eq!(json["arming"], "expiry");
    let session = &json["session"];
    assert_eq!(session["customer_name"], "Riley");
    assert_eq!(session["membership_tier"], "premium");
    assert_eq!(session["location"], "north");
    assert_eq!(session["status"], "active");
    assert_eq!(session["kind"], "simulator");
}

#[tokio::test]
async fn start_session_defaults_duration_and_location() {
    let (app, _clock, _state) = app();
    let (status, json) = post_json(
        app,
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-2" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["time_remaining"], "1h 0m");
    assert_eq!(json["session"]["location"], "main");
}

#[tokio::test]
async fn start_session_unknown_bay_is_404() {
    let (app, _clock, _state) = app();
    let (status, json) = post_json(
        app,
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-99" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("bay-99"));
}

#[tokio::test]
async fn start_session_rejects_non_positive_duration() {
    let (app, _clock, _state) = app();
    let (status, _json) = post_json(
        app,
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1", "duration_minutes": 0 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schedule_then_wait_text() {
    let (app, _clock, _state) = app();
    let (status, json) = post_json(
        app,
        "/api/session/schedule",
        serde_json::json!({
            "bay_id": "bay-1",
            "start_time": "2025-06-01T18:45:00Z",
            "duration_minutes": 60
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking_state"], "upcoming_booking");
    assert_eq!(json["time_until_start"], "45m");
    assert!(json["time_remaining"].is_null());
    assert_eq!(json["arming"], "promotion");
}

#[tokio::test]
async fn extend_then_overtime() {
    let (app, clock, _state) = app();
    post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1", "duration_minutes": 30 }),
    )
    .await;

    let (status, json) = post_json(
        app.clone(),
        "/api/session/extend",
        serde_json::json!({ "minutes": 15 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["time_remaining"], "45m");

    clock.advance(Duration::minutes(45));
    let (_, json) = get(app.clone(), "/api/session").await;
    assert_eq!(json["time_remaining"], "Overtime");

    let (status, _) = post_json(app, "/api/session/extend", serde_json::json!({ "minutes": -5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_minutes_are_rejected() {
    let (app, _clock, _state) = app();
    let (status, json) = post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1", "duration_minutes": i64::MAX }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("out of range"));

    post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1", "duration_minutes": 30 }),
    )
    .await;
    let (status, _) = post_json(
        app.clone(),
        "/api/session/extend",
        serde_json::json!({ "minutes": i64::MAX }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The tracker is still usable and unchanged.
    let (status, json) = get(app, "/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["time_remaining"], "30m");
}

#[tokio::test]
async fn huge_duration_pins_planned_end() {
    let (app, _clock, _state) = app();
    let (status, json) = post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1", "duration_minutes": 150_000_000_000_i64 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_active"], true);
    assert!(json["time_remaining"].is_string());

    let (status, json) = post_json(
        app,
        "/api/session/extend",
        serde_json::json!({ "minutes": 150_000_000_000_i64 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_active"], true);
}

#[tokio::test]
async fn end_archives_and_clears() {
    let (app, clock, _state) = app();
    post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1", "duration_minutes": 60 }),
    )
    .await;
    clock.advance(Duration::minutes(25));

    let (status, json) = post(app, "/api/session/end").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["session"].is_null());
    assert!(json["bay_name"].is_null());
    assert!(json["time_remaining"].is_null());
    assert_eq!(json["is_active"], false);
    assert_eq!(json["last_session"]["status"], "completed");
    assert_eq!(json["last_session"]["actual_end_time"], "2025-06-01T18:25:00Z");
}

#[tokio::test]
async fn cancel_and_clear() {
    let (app, _clock, _state) = app();
    post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-1" }),
    )
    .await;
    let (_, json) = post(app.clone(), "/api/session/cancel").await;
    assert_eq!(json["last_session"]["status"], "cancelled");

    post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-2" }),
    )
    .await;
    let (_, json) = post(app, "/api/session/clear").await;
    assert!(json["session"].is_null());
    // Clearing does not archive; the cancelled session is still the last one.
    assert_eq!(json["last_session"]["status"], "cancelled");
    assert_eq!(json["last_session"]["bay_id"], "bay-1");
}

#[tokio::test]
async fn end_without_session_is_noop() {
    let (app, _clock, _state) = app();
    let (status, json) = post(app, "/api/session/end").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["session"].is_null());
    assert!(json["last_session"].is_null());
}

#[tokio::test]
async fn put_bays_replaces_list_and_flags_mismatch() {
    let (app, _clock, state) = app();
    let mut events = state.service.subscribe();

    post_json(
        app.clone(),
        "/api/session/start",
        serde_json::json!({ "bay_id": "bay-2" }),
    )
    .await;

    let mut updated = bays();
    updated[1].is_available = true;
    let (status, json) = send(
        app.clone(),
        "PUT",
        "/api/bays",
        Some(serde_json::to_value(&updated).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, listed) = get(app.clone(), "/api/bays").await;
    assert_eq!(listed[1]["is_available"], true);

    let mut saw_mismatch = false;
    while let Ok(Ok(event)) =
        tokio::time::timeout(std::time::Duration::from_secs(2), events.recv()).await
    {
        if event.name() == "bay_mismatch" {
            saw_mismatch = true;
            break;
        }
    }
    assert!(saw_mismatch);

    // Observe-only by default: the session is still running.
    let (_, json) = get(app, "/api/session").await;
    assert_eq!(json["is_active"], true);
}

#[tokio::test]
async fn put_bays_rejects_empty_ids() {
    let (app, _clock, _state) = app();
    let (status, _) = send(
        app,
        "PUT",
        "/api/bays",
        Some(serde_json::json!([{ "id": " ", "name": "Ghost", "is_available": true }])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

use axum::extract::State;
use axum::Json;
use bayline_core::{Arming, Bay, BayStatusProvider, BookingState, Session, SessionTracker};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session: Option<Session>,
    pub booking_state: BookingState,
    pub is_active: bool,
    pub bay_name: Option<String>,
    pub time_remaining: Option<String>,
    pub time_until_start: Option<String>,
    pub last_session: Option<Session>,
    pub arming: Arming,
}

impl SessionView {
    fn of(tracker: &SessionTracker) -> Self {
        Self {
            session: tracker.current().cloned(),
            booking_state: tracker.booking_state(),
            is_active: tracker.is_session_active(),
            bay_name: tracker.current_bay_name().map(str::to_owned),
            time_remaining: tracker.session_time_remaining(),
            time_until_start: tracker.time_until_start_text(),
            last_session: tracker.last_session().cloned(),
            arming: tracker.arming(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartBody {
    pub bay_id: String,
    pub location: Option<String>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
    pub bay_id: String,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExtendBody {
    pub minutes: i64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn lookup_bay(app: &AppState, bay_id: &str) -> Result<Bay, AppError> {
    app.service
        .bays()
        .find(bay_id)
        .ok_or_else(|| AppError::bay_not_found(bay_id))
}

fn duration_or_default(app: &AppState, minutes: Option<i64>) -> Result<Duration, AppError> {
    match minutes {
        None => Ok(app.service.config().default_duration()),
        Some(m) => positive_minutes("duration_minutes", m),
    }
}

fn positive_minutes(field: &str, m: i64) -> Result<Duration, AppError> {
    if m <= 0 {
        return Err(AppError::bad_request(format!(
            "{field} must be positive, got {m}"
        )));
    }
    Duration::try_minutes(m)
        .ok_or_else(|| AppError::bad_request(format!("{field} is out of range, got {m}")))
}

/// Explicit location, else the bay's own, else the configured default.
fn location_for(app: &AppState, bay: &Bay, location: Option<String>) -> String {
    location
        .filter(|l| !l.trim().is_empty())
        .or_else(|| (!bay.location.is_empty()).then(|| bay.location.clone()))
        .unwrap_or_else(|| app.service.config().default_location.clone())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/session: current session and derived display state.
pub async fn get_session(State(app): State<AppState>) -> Json<SessionView> {
    Json(app.service.read(SessionView::of))
}

/// POST /api/session/start: start playing on a bay now.
pub async fn start_session(
    State(app): State<AppState>,
    Json(body): Json<StartBody>,
) -> Result<Json<SessionView>, AppError> {
    let bay = lookup_bay(&app, &body.bay_id)?;
    let duration = duration_or_default(&app, body.duration_minutes)?;
    let location = location_for(&app, &bay, body.location);

    let view = app.service.update(|t| {
        t.start_session(&bay, location, duration);
        SessionView::of(t)
    });
    Ok(Json(view))
}

/// POST /api/session/schedule: book a bay for a future start.
pub async fn schedule_session(
    State(app): State<AppState>,
    Json(body): Json<ScheduleBody>,
) -> Result<Json<SessionView>, AppError> {
    let bay = lookup_bay(&app, &body.bay_id)?;
    let duration = duration_or_default(&app, body.duration_minutes)?;
    let location = location_for(&app, &bay, body.location);

    let view = app.service.update(|t| {
        t.schedule_upcoming_session(&bay, location, body.start_time, duration);
        SessionView::of(t)
    });
    Ok(Json(view))
}

/// POST /api/session/extend: push the planned end out.
pub async fn extend_session(
    State(app): State<AppState>,
    Json(body): Json<ExtendBody>,
) -> Result<Json<SessionView>, AppError> {
    let extra = positive_minutes("minutes", body.minutes)?;
    let view = app.service.update(|t| {
        t.extend_session(extra);
        SessionView::of(t)
    });
    Ok(Json(view))
}

/// POST /api/session/end: complete the current session.
pub async fn end_session(State(app): State<AppState>) -> Json<SessionView> {
    Json(app.service.update(|t| {
        t.end_session();
        SessionView::of(t)
    }))
}

/// POST /api/session/cancel: cancel the current session.
pub async fn cancel_session(State(app): State<AppState>) -> Json<SessionView> {
    Json(app.service.update(|t| {
        t.cancel_session();
        SessionView::of(t)
    }))
}

/// POST /api/session/clear: drop the current session without archiving it.
pub async fn clear_session(State(app): State<AppState>) -> Json<SessionView> {
    Json(app.service.update(|t| {
        t.clear_session();
        SessionView::of(t)
    }))
}

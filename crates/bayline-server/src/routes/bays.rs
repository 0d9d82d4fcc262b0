use axum::extract::State;
use axum::Json;
use bayline_core::{Bay, BayStatusProvider};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/bays: the latest bay list from the feed.
pub async fn list_bays(State(app): State<AppState>) -> Json<Vec<Bay>> {
    Json(app.service.bays().bays())
}

/// PUT /api/bays: replace the bay list. The session cross-check runs on the
/// feed watcher, not in this request.
pub async fn put_bays(
    State(app): State<AppState>,
    Json(bays): Json<Vec<Bay>>,
) -> Result<Json<Vec<Bay>>, AppError> {
    if let Some(bay) = bays.iter().find(|b| b.id.trim().is_empty()) {
        return Err(AppError::bad_request(format!(
            "bay '{}' has an empty id",
            bay.name
        )));
    }
    app.service.bays().publish(bays.clone());
    Ok(Json(bays))
}

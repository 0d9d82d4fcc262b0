use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bayline_core::BaylineError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 400 Bad Request errors
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain without
/// widening the `BaylineError` enum.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn bay_not_found(bay_id: impl Into<String>) -> Self {
        Self(BaylineError::BayNotFound(bay_id.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<BaylineError>() {
            match e {
                BaylineError::BayNotFound(_) => StatusCode::NOT_FOUND,
                BaylineError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                BaylineError::InvalidStatus(_)
                | BaylineError::InvalidTier(_)
                | BaylineError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
                BaylineError::Io(_) | BaylineError::Yaml(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

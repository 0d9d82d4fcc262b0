use std::sync::Arc;

use crate::service::TrackerService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TrackerService>,
}

impl AppState {
    pub fn new(service: TrackerService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

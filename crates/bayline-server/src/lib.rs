pub mod bays;
pub mod error;
pub mod routes;
pub mod service;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use bayline_core::config::Config;
use bayline_core::{IdentityProvider, SystemClock};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use bays::BayFeed;
pub use service::TrackerService;
pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Session
        .route("/api/session", get(routes::session::get_session))
        .route("/api/session/start", post(routes::session::start_session))
        .route(
            "/api/session/schedule",
            post(routes::session::schedule_session),
        )
        .route("/api/session/extend", post(routes::session::extend_session))
        .route("/api/session/end", post(routes::session::end_session))
        .route("/api/session/cancel", post(routes::session::cancel_session))
        .route("/api/session/clear", post(routes::session::clear_session))
        // Bays
        .route(
            "/api/bays",
            get(routes::bays::list_bays).put(routes::bays::put_bays),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the tracker and serve it on `config.server.bind:port` until the
/// server stops.
pub async fn serve(
    config: Config,
    identity: Arc<dyn IdentityProvider>,
    bays: BayFeed,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, identity, bays, listener).await
}

/// Like [`serve`], on a listener the caller already bound (useful when the
/// port is 0 and the OS picks one).
pub async fn serve_on(
    config: Config,
    identity: Arc<dyn IdentityProvider>,
    bays: BayFeed,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual = listener.local_addr()?;
    let service = TrackerService::spawn(Arc::new(SystemClock), identity, config.tracker, bays);
    let state = AppState::new(service);
    let app = build_router(state.clone());

    tracing::info!("bayline listening on http://{actual}");

    let result = axum::serve(listener, app).await;
    state.service.shutdown();
    result?;
    Ok(())
}

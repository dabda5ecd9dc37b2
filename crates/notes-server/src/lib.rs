pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use notes_core::config::Config;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Notes
        .route("/api/notes", get(routes::notes::list_notes))
        .route(
            "/api/notes/{note_id}",
            get(routes::notes::get_note).put(routes::notes::update_note),
        )
        // Note actions: any editable verb triggers
        .route(
            "/api/notes/{note_id}/action/{action_id}",
            axum::routing::post(routes::actions::trigger_note_action)
                .put(routes::actions::trigger_note_action)
                .patch(routes::actions::trigger_note_action),
        )
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the notes API server on `bind:port`.
pub async fn serve(root: PathBuf, config: Config, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, config, listener).await
}

/// Start the notes API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    root: PathBuf,
    config: Config,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    let auth_enabled = config.auth.enabled();
    let app = build_router(state::AppState::new(root, config));

    tracing::info!(auth_enabled, "notes API listening on http://{local}");

    axum::serve(listener, app).await?;
    Ok(())
}

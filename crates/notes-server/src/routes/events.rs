use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: SSE stream emitting `note_action` for every triggered action.
///
/// Lagged receivers silently skip the events they missed.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let taken = msg.ok()?;
        let data = serde_json::to_string(&taken).ok()?;
        Some(Ok::<Event, Infallible>(
            Event::default().event("note_action").data(data),
        ))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use notes_core::auth::{Authorizer, Principal};
use notes_core::store::NoteStore;
use notes_core::trigger::TriggerService;

use crate::error::{parse_id, AppError};
use crate::routes::notes::note_to_json;
use crate::state::AppState;

/// POST|PUT|PATCH /api/notes/:note_id/action/:action_id: trigger a note action.
///
/// Path IDs are validated here; the edit permission is checked against the
/// stored note before the trigger service runs. A missing note falls through
/// to the service so it reports the note-level not-found error.
pub async fn trigger_note_action(
    State(app): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((note_id, action_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let note_id = parse_id(&note_id, "note_id")?;
    let action_id = parse_id(&action_id, "action_id")?;

    let note = tokio::task::spawn_blocking(move || {
        if let Some(current) = app.store.get(note_id)? {
            if !app.authorizer.can_edit(&principal, &current) {
                tracing::debug!(note_id, by = %principal.name, "trigger refused");
                return Err(AppError::cannot_edit());
            }
        }
        let service = TriggerService::new(app.store.as_ref(), &app.hooks, app.config.persistence);
        Ok::<_, AppError>(service.trigger(note_id, action_id)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(note_to_json(&note)))
}

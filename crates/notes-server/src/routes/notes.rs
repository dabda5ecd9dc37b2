use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, HeaderValue},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use notes_core::auth::{Authorizer, Principal};
use notes_core::error::NotesError;
use notes_core::note::{Note, NoteStatus, NoteType};
use notes_core::store::{save_with_retry, NoteQuery, NoteStore, SortOrder, DEFAULT_PER_PAGE};
use serde::Deserialize;

use crate::error::{parse_id, AppError};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Raw query string; parsed by hand so bad values get the JSON error shape.
#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub note_type: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    fn parse(&self) -> Result<NoteQuery, NotesError> {
        let statuses = split_csv(self.status.as_deref())
            .map(str::parse::<NoteStatus>)
            .collect::<Result<Vec<_>, _>>()?;
        let types = split_csv(self.note_type.as_deref())
            .map(str::parse::<NoteType>)
            .collect::<Result<Vec<_>, _>>()?;
        let page = parse_number(self.page.as_deref(), "page", 1)?;
        let per_page = parse_number(self.per_page.as_deref(), "per_page", DEFAULT_PER_PAGE)?;
        let order = match self.order.as_deref() {
            Some(o) => o.parse()?,
            None => SortOrder::default(),
        };
        let query = NoteQuery {
            statuses,
            types,
            page,
            per_page,
            order,
        };
        query.validate()?;
        Ok(query)
    }
}

fn split_csv(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_number(raw: Option<&str>, name: &str, default: usize) -> Result<usize, NotesError> {
    match raw {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| NotesError::InvalidParam(format!("{name} must be a positive integer"))),
    }
}

/// GET /api/notes: list notes, filtered and paginated.
pub async fn list_notes(
    State(app): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<ListQuery>,
) -> Result<(HeaderMap, Json<serde_json::Value>), AppError> {
    if !app.authorizer.can_read(&principal) {
        return Err(AppError::cannot_view());
    }
    let query = q.parse()?;
    let store = app.store.clone();
    let page = tokio::task::spawn_blocking(move || store.list(&query))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    let mut headers = HeaderMap::new();
    headers.insert("x-wp-total", HeaderValue::from(page.total));
    headers.insert("x-wp-totalpages", HeaderValue::from(page.total_pages));
    let list: Vec<serde_json::Value> = page.notes.iter().map(note_to_json).collect();
    Ok((headers, Json(serde_json::json!(list))))
}

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

/// GET /api/notes/:note_id: single note.
pub async fn get_note(
    State(app): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(note_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !app.authorizer.can_read(&principal) {
        return Err(AppError::cannot_view());
    }
    let note_id = parse_id(&note_id, "note_id")?;
    let store = app.store.clone();
    let note = tokio::task::spawn_blocking(move || {
        store.get(note_id)?.ok_or(NotesError::NoteNotFound(note_id))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(note_to_json(&note)))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct UpdateBody {
    pub status: Option<String>,
    pub date_reminder: Option<DateTime<Utc>>,
}

/// PUT /api/notes/:note_id: change status and/or reminder date.
///
/// Status changes follow [`Note::update`]: snoozing needs a snoozable note
/// and a reminder, leaving `snoozed` drops the old reminder.
pub async fn update_note(
    State(app): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(note_id): Path<String>,
    body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let note_id = parse_id(&note_id, "note_id")?;
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let status = body
        .status
        .as_deref()
        .map(str::parse::<NoteStatus>)
        .transpose()?;

    let note = tokio::task::spawn_blocking(move || {
        let mut note = app
            .store
            .get(note_id)?
            .ok_or(NotesError::NoteNotFound(note_id))?;
        if !app.authorizer.can_edit(&principal, &note) {
            return Err(AppError::cannot_edit());
        }

        note.update(status, body.date_reminder)?;

        save_with_retry(app.store.as_ref(), &note, &app.config.persistence)?;
        tracing::info!(note_id, status = %note.status, by = %principal.name, "note updated");
        Ok::<_, AppError>(note)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(note_to_json(&note)))
}

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

/// Public representation of a note, shared by every endpoint returning one.
pub fn note_to_json(n: &Note) -> serde_json::Value {
    let actions: Vec<serde_json::Value> = n
        .actions
        .iter()
        .map(|a| {
            serde_json::json!({
                "id": a.id,
                "name": a.name,
                "label": a.label,
                "url": a.url,
                "status": a.status.to_string(),
                "primary": a.primary,
            })
        })
        .collect();
    serde_json::json!({
        "id": n.id,
        "name": n.name,
        "type": n.note_type.to_string(),
        "title": n.title,
        "content": n.content,
        "status": n.status.to_string(),
        "source": n.source,
        "is_snoozable": n.is_snoozable,
        "date_created": n.date_created,
        "date_reminder": n.date_reminder,
        "actions": actions,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Note persistence.
//!
//! Layout:
//!   .notes/notes/<id>.yaml  : one manifest per note, actions inline
//!
//! Note IDs are allocated as `max(existing) + 1`. Saving a note rewrites only
//! that note's file, so concurrent writers to the same note are
//! last-write-wins and writers to different notes never interfere.

use crate::config::PersistenceConfig;
use crate::error::{NotesError, Result};
use crate::io;
use crate::note::{Note, NoteStatus, NoteType};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = NotesError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(NotesError::InvalidParam(format!(
                "order must be asc or desc, got '{s}'"
            ))),
        }
    }
}

/// Filters and pagination for listing notes. Empty filter lists match all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    pub statuses: Vec<NoteStatus>,
    pub types: Vec<NoteType>,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
    pub order: SortOrder,
}

impl Default for NoteQuery {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            types: Vec::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            order: SortOrder::Desc,
        }
    }
}

impl NoteQuery {
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(NotesError::InvalidParam("page must be at least 1".into()));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(NotesError::InvalidParam(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(())
    }

    fn matches(&self, note: &Note) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&note.status))
            && (self.types.is_empty() || self.types.contains(&note.note_type))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotePage {
    pub notes: Vec<Note>,
    pub total: usize,
    pub total_pages: usize,
}

/// Filter, sort, and slice `notes` according to `query`.
pub fn paginate(mut notes: Vec<Note>, query: &NoteQuery) -> Result<NotePage> {
    query.validate()?;
    notes.retain(|n| query.matches(n));
    notes.sort_by(|a, b| a.date_created.cmp(&b.date_created).then(a.id.cmp(&b.id)));
    if query.order == SortOrder::Desc {
        notes.reverse();
    }
    let total = notes.len();
    let total_pages = total.div_ceil(query.per_page);
    // A page past usize range is simply past the end.
    let offset = (query.page - 1)
        .checked_mul(query.per_page)
        .unwrap_or(usize::MAX);
    let notes = notes
        .into_iter()
        .skip(offset)
        .take(query.per_page)
        .collect();
    Ok(NotePage {
        notes,
        total,
        total_pages,
    })
}

// ---------------------------------------------------------------------------
// NoteStore
// ---------------------------------------------------------------------------

pub trait NoteStore: Send + Sync {
    fn get(&self, id: u64) -> Result<Option<Note>>;

    fn list(&self, query: &NoteQuery) -> Result<NotePage>;

    /// Allocate an ID for `note`, persist it, and return the stored copy.
    fn create(&self, note: Note) -> Result<Note>;

    /// Durably persist `note`. Returns only after the write is complete.
    fn save(&self, note: &Note) -> Result<()>;
}

/// Save `note`, retrying with doubling backoff per `policy`.
///
/// After the final failed attempt the last store error is wrapped in
/// [`NotesError::Persistence`].
pub fn save_with_retry(store: &dyn NoteStore, note: &Note, policy: &PersistenceConfig) -> Result<()> {
    let attempts = policy.save_attempts.max(1);
    let mut backoff = Duration::from_millis(policy.backoff_ms);
    let mut attempt = 1;
    loop {
        match store.save(note) {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= attempts => {
                tracing::error!(note_id = note.id, attempts, "giving up on note save: {e}");
                return Err(NotesError::Persistence {
                    note_id: note.id,
                    attempts,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                tracing::warn!(note_id = note.id, attempt, "note save failed, retrying: {e}");
                std::thread::sleep(backoff);
                backoff *= 2;
                attempt += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FileNoteStore
// ---------------------------------------------------------------------------

pub struct FileNoteStore {
    root: PathBuf,
    create_lock: Mutex<()>,
}

impl FileNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            create_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn note_ids(&self) -> Result<Vec<u64>> {
        let dir = paths::note_files_dir(&self.root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(id) = paths::note_id_from_file_name(&entry.file_name().to_string_lossy()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

impl NoteStore for FileNoteStore {
    fn get(&self, id: u64) -> Result<Option<Note>> {
        let path = paths::note_path(&self.root, id);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let note: Note = serde_yaml::from_str(&data)?;
        Ok(Some(note))
    }

    fn list(&self, query: &NoteQuery) -> Result<NotePage> {
        let mut notes = Vec::new();
        for id in self.note_ids()? {
            // A file removed between read_dir and read is simply skipped.
            if let Some(note) = self.get(id)? {
                notes.push(note);
            }
        }
        paginate(notes, query)
    }

    fn create(&self, mut note: Note) -> Result<Note> {
        let _guard = self
            .create_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = self.note_ids()?.into_iter().max().unwrap_or(0) + 1;
        note.id = next;
        self.save(&note)?;
        tracing::debug!(note_id = note.id, name = %note.name, "created note");
        Ok(note)
    }

    fn save(&self, note: &Note) -> Result<()> {
        let path = paths::note_path(&self.root, note.id);
        let data = serde_yaml::to_string(note)?;
        io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("not initialized: run 'notes init'")]
    NotInitialized,

    #[error("note not found: {0}")]
    NoteNotFound(u64),

    #[error("action {action_id} not found on note {note_id}")]
    ActionNotFound { note_id: u64, action_id: u64 },

    #[error("invalid note status '{0}': must be unactioned, actioned, or snoozed")]
    InvalidStatus(String),

    #[error("invalid note type '{0}': must be error, warning, update, info, or marketing")]
    InvalidNoteType(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("note {0} cannot be snoozed")]
    NotSnoozable(u64),

    #[error("failed to save note {note_id} after {attempts} attempt(s): {source}")]
    Persistence {
        note_id: u64,
        attempts: u32,
        #[source]
        source: Box<NotesError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotesError>;

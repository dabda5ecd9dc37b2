//! Admin notes and the actions attached to them.
//!
//! A note owns an ordered list of actions. Action IDs are allocated by the
//! note itself (`next_action_id`), so they are unique within a note but not
//! across notes.

use crate::error::{NotesError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NoteStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Unactioned,
    Actioned,
    Snoozed,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Unactioned => "unactioned",
            NoteStatus::Actioned => "actioned",
            NoteStatus::Snoozed => "snoozed",
        }
    }
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteStatus {
    type Err = NotesError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unactioned" => Ok(NoteStatus::Unactioned),
            "actioned" => Ok(NoteStatus::Actioned),
            "snoozed" => Ok(NoteStatus::Snoozed),
            _ => Err(NotesError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// NoteType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    Error,
    Warning,
    Update,
    Info,
    Marketing,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Error => "error",
            NoteType::Warning => "warning",
            NoteType::Update => "update",
            NoteType::Info => "info",
            NoteType::Marketing => "marketing",
        }
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteType {
    type Err = NotesError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "error" => Ok(NoteType::Error),
            "warning" => Ok(NoteType::Warning),
            "update" => Ok(NoteType::Update),
            "info" => Ok(NoteType::Info),
            "marketing" => Ok(NoteType::Marketing),
            _ => Err(NotesError::InvalidNoteType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// NoteAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteAction {
    pub id: u64,
    /// Hook dispatch key; the name-qualified action event is derived from it.
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Status the parent note moves to when this action is triggered.
    pub status: NoteStatus,
    #[serde(default)]
    pub primary: bool,
}

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub title: String,
    pub content: String,
    pub status: NoteStatus,
    #[serde(default)]
    pub source: String,
    #[serde(default = "default_snoozable")]
    pub is_snoozable: bool,
    pub date_created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions: Vec<NoteAction>,
    #[serde(default = "default_next_action_id")]
    pub next_action_id: u64,
}

fn default_snoozable() -> bool {
    true
}

fn default_next_action_id() -> u64 {
    1
}

impl Note {
    /// Build an unsaved, unactioned info note. The store assigns `id` on create.
    pub fn new(name: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            note_type: NoteType::Info,
            title: title.into(),
            content: content.into(),
            status: NoteStatus::Unactioned,
            source: String::new(),
            is_snoozable: default_snoozable(),
            date_created: Utc::now(),
            date_reminder: None,
            actions: Vec::new(),
            next_action_id: default_next_action_id(),
        }
    }

    /// Append an action and return its note-local ID.
    pub fn add_action(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        status: NoteStatus,
        url: Option<String>,
        primary: bool,
    ) -> u64 {
        // Guard against hand-edited files whose counter lags behind.
        let max_existing = self.actions.iter().map(|a| a.id).max().unwrap_or(0);
        let id = self.next_action_id.max(max_existing + 1);
        self.next_action_id = id + 1;
        self.actions.push(NoteAction {
            id,
            name: name.into(),
            label: label.into(),
            url,
            status,
            primary,
        });
        id
    }

    /// First action with the given ID, in stored order.
    ///
    /// Duplicate action IDs within one note are a data-integrity violation;
    /// when they occur the earliest entry wins.
    pub fn find_action(&self, action_id: u64) -> Option<&NoteAction> {
        self.actions.iter().find(|a| a.id == action_id)
    }

    pub fn snooze(&mut self, until: DateTime<Utc>) -> Result<()> {
        if !self.is_snoozable {
            return Err(NotesError::NotSnoozable(self.id));
        }
        self.status = NoteStatus::Snoozed;
        self.date_reminder = Some(until);
        Ok(())
    }

    /// Apply a partial status/reminder update.
    ///
    /// Moving to `snoozed` always goes through [`Note::snooze`] and needs a
    /// reminder, either from `reminder` or one already on the note. Any other
    /// status clears the reminder unless a new one is given.
    pub fn update(&mut self, status: Option<NoteStatus>, reminder: Option<DateTime<Utc>>) -> Result<()> {
        match status {
            Some(NoteStatus::Snoozed) => {
                if !self.is_snoozable {
                    return Err(NotesError::NotSnoozable(self.id));
                }
                let until = reminder.or(self.date_reminder).ok_or_else(|| {
                    NotesError::InvalidParam("date_reminder is required to snooze a note".into())
                })?;
                self.snooze(until)
            }
            Some(other) => {
                self.status = other;
                self.date_reminder = reminder;
                Ok(())
            }
            None => {
                if reminder.is_some() {
                    self.date_reminder = reminder;
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

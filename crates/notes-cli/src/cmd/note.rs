use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Subcommand;
use notes_core::config::Config;
use notes_core::error::NotesError;
use notes_core::hooks::{ActionTaken, HookRegistry, NOTE_ACTION_EVENT};
use notes_core::note::{Note, NoteStatus, NoteType};
use notes_core::store::{save_with_retry, FileNoteStore, NoteQuery, NoteStore, SortOrder};
use notes_core::trigger::TriggerService;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand tree
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum NoteSubcommand {
    /// Create a new note
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        content: String,

        /// Producer-assigned identifier (default: derived from the title)
        #[arg(long)]
        name: Option<String>,

        /// Type: error | warning | update | info | marketing
        #[arg(long = "type", default_value = "info")]
        note_type: String,

        /// Where the note came from (plugin or subsystem)
        #[arg(long, default_value = "")]
        source: String,

        /// Mark the note as not snoozable
        #[arg(long)]
        no_snooze: bool,
    },

    /// List notes, newest first
    List {
        /// Filter by status (comma-separated): unactioned | actioned | snoozed
        #[arg(long)]
        status: Option<String>,

        /// Filter by type (comma-separated)
        #[arg(long = "type")]
        note_type: Option<String>,

        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value = "20")]
        per_page: usize,

        /// Oldest first
        #[arg(long)]
        asc: bool,
    },

    /// Show a single note and its actions
    Show { id: u64 },

    /// Attach an action to a note
    Action {
        note_id: u64,

        /// Action name; hooks subscribe to it
        #[arg(long)]
        name: String,

        #[arg(long)]
        label: String,

        /// Status the note moves to when this action is triggered
        #[arg(long, default_value = "actioned")]
        status: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        primary: bool,
    },

    /// Trigger an action on a note
    Trigger { note_id: u64, action_id: u64 },

    /// Snooze a note for a number of hours
    Snooze {
        note_id: u64,

        #[arg(long, default_value = "24")]
        hours: i64,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcommand: NoteSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load .notes/config.yaml")?;
    let store = FileNoteStore::new(root);

    match subcommand {
        NoteSubcommand::Add {
            title,
            content,
            name,
            note_type,
            source,
            no_snooze,
        } => {
            let name = name.unwrap_or_else(|| slugify(&title));
            let mut note = Note::new(name, title, content);
            note.note_type = note_type.parse()?;
            note.source = source;
            note.is_snoozable = !no_snooze;
            let note = store.create(note)?;
            if json {
                print_json(&note)?;
            } else {
                println!("created note {} ({})", note.id, note.name);
            }
            Ok(())
        }

        NoteSubcommand::List {
            status,
            note_type,
            page,
            per_page,
            asc,
        } => {
            let query = NoteQuery {
                statuses: parse_csv::<NoteStatus>(status.as_deref())?,
                types: parse_csv::<NoteType>(note_type.as_deref())?,
                page,
                per_page,
                order: if asc { SortOrder::Asc } else { SortOrder::Desc },
            };
            let result = store.list(&query)?;
            if json {
                print_json(&result)?;
                return Ok(());
            }
            if result.notes.is_empty() {
                println!("no notes");
                return Ok(());
            }
            print_table(
                &["ID", "TYPE", "STATUS", "ACTIONS", "TITLE"],
                result
                    .notes
                    .iter()
                    .map(|n| {
                        vec![
                            n.id.to_string(),
                            n.note_type.to_string(),
                            n.status.to_string(),
                            n.actions.len().to_string(),
                            truncate(&n.title, 60),
                        ]
                    })
                    .collect(),
            );
            println!();
            println!(
                "page {} of {} ({} total)",
                query.page,
                result.total_pages.max(1),
                result.total
            );
            Ok(())
        }

        NoteSubcommand::Show { id } => {
            let note = load(&store, id)?;
            if json {
                print_json(&note)?;
                return Ok(());
            }
            println!("ID:       {}", note.id);
            println!("Name:     {}", note.name);
            println!("Type:     {}", note.note_type);
            println!("Status:   {}", note.status);
            println!("Title:    {}", note.title);
            println!("Content:  {}", note.content);
            if !note.source.is_empty() {
                println!("Source:   {}", note.source);
            }
            if let Some(r) = note.date_reminder {
                println!("Reminder: {}", r.format("%Y-%m-%d %H:%M UTC"));
            }
            println!("Created:  {}", note.date_created.format("%Y-%m-%d %H:%M UTC"));
            if !note.actions.is_empty() {
                println!();
                print_table(
                    &["ACTION", "NAME", "LABEL", "SETS", "URL"],
                    note.actions
                        .iter()
                        .map(|a| {
                            vec![
                                format!("{}{}", a.id, if a.primary { "*" } else { "" }),
                                a.name.clone(),
                                a.label.clone(),
                                a.status.to_string(),
                                a.url.clone().unwrap_or_default(),
                            ]
                        })
                        .collect(),
                );
            }
            Ok(())
        }

        NoteSubcommand::Action {
            note_id,
            name,
            label,
            status,
            url,
            primary,
        } => {
            let status: NoteStatus = status.parse()?;
            let mut note = load(&store, note_id)?;
            let action_id = note.add_action(name, label, status, url, primary);
            save_with_retry(&store, &note, &config.persistence)?;
            if json {
                print_json(&serde_json::json!({
                    "note_id": note_id,
                    "action_id": action_id,
                }))?;
            } else {
                println!("added action {action_id} to note {note_id}");
            }
            Ok(())
        }

        NoteSubcommand::Trigger { note_id, action_id } => {
            let hooks = HookRegistry::new();
            hooks.subscribe(NOTE_ACTION_EVENT, |e: &ActionTaken| {
                tracing::info!(note_id = e.note_id, action = %e.action.name, "note action fired");
                Ok(())
            });
            let note = TriggerService::new(&store, &hooks, config.persistence)
                .trigger(note_id, action_id)?;
            if json {
                print_json(&note)?;
            } else {
                println!("note {} is now {}", note.id, note.status);
            }
            Ok(())
        }

        NoteSubcommand::Snooze { note_id, hours } => {
            if hours <= 0 {
                anyhow::bail!("--hours must be positive");
            }
            let until = Duration::try_hours(hours)
                .and_then(|d| Utc::now().checked_add_signed(d))
                .with_context(|| format!("--hours {hours} is out of range"))?;
            let mut note = load(&store, note_id)?;
            note.snooze(until)?;
            save_with_retry(&store, &note, &config.persistence)?;
            if json {
                print_json(&note)?;
            } else {
                println!("note {} snoozed for {hours}h", note.id);
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load(store: &FileNoteStore, id: u64) -> anyhow::Result<Note> {
    Ok(store.get(id)?.ok_or(NotesError::NoteNotFound(id))?)
}

fn parse_csv<T>(raw: Option<&str>) -> Result<Vec<T>, NotesError>
where
    T: std::str::FromStr<Err = NotesError>,
{
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<T>)
        .collect()
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Welcome to the Store!"), "welcome-to-the-store");
        assert_eq!(slugify("  --Hi--  "), "hi");
    }

    #[test]
    fn parse_csv_reads_statuses() {
        let parsed: Vec<NoteStatus> = parse_csv(Some("actioned,snoozed")).unwrap();
        assert_eq!(parsed, [NoteStatus::Actioned, NoteStatus::Snoozed]);
        assert!(parse_csv::<NoteStatus>(Some("nope")).is_err());
        assert!(parse_csv::<NoteType>(None).unwrap().is_empty());
    }
}

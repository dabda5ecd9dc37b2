//! Note action trigger service.
//!
//! Order of operations: look up the note, look up the action, set the status,
//! persist (with retry), then dispatch the generic and the name-qualified
//! action events. Hooks only fire for changes that were durably recorded.

use crate::config::PersistenceConfig;
use crate::error::{NotesError, Result};
use crate::hooks::{action_event_name, ActionTaken, HookRegistry, NOTE_ACTION_EVENT};
use crate::note::Note;
use crate::store::{save_with_retry, NoteStore};

pub struct TriggerService<'a> {
    store: &'a dyn NoteStore,
    hooks: &'a HookRegistry,
    persistence: PersistenceConfig,
}

impl<'a> TriggerService<'a> {
    pub fn new(store: &'a dyn NoteStore, hooks: &'a HookRegistry, persistence: PersistenceConfig) -> Self {
        Self {
            store,
            hooks,
            persistence,
        }
    }

    /// Execute action `action_id` on note `note_id` and return the stored note.
    ///
    /// Not idempotent with respect to hooks: every successful call dispatches
    /// both events, even when the status was already the target status.
    pub fn trigger(&self, note_id: u64, action_id: u64) -> Result<Note> {
        let mut note = self
            .store
            .get(note_id)?
            .ok_or(NotesError::NoteNotFound(note_id))?;

        let action = note
            .find_action(action_id)
            .cloned()
            .ok_or(NotesError::ActionNotFound { note_id, action_id })?;

        let previous = note.status;
        note.status = action.status;
        save_with_retry(self.store, &note, &self.persistence)?;

        tracing::info!(
            note_id,
            action_id,
            action = %action.name,
            from = %previous,
            to = %note.status,
            "note action triggered"
        );

        let event = ActionTaken {
            note_id,
            status: note.status,
            action,
        };
        self.hooks.dispatch(NOTE_ACTION_EVENT, &event);
        self.hooks.dispatch(&action_event_name(&event.action.name), &event);

        Ok(note)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{NoteAction, NoteStatus};
    use crate::store::{FileNoteStore, NotePage, NoteQuery};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn fast_retry(attempts: u32) -> PersistenceConfig {
        PersistenceConfig {
            save_attempts: attempts,
            backoff_ms: 0,
        }
    }

    fn action(id: u64, name: &str, status: NoteStatus) -> NoteAction {
        NoteAction {
            id,
            name: name.into(),
            label: name.into(),
            url: None,
            status,
            primary: false,
        }
    }

    /// Store one note carrying the given actions and return its ID.
    fn seed(store: &FileNoteStore, actions: Vec<NoteAction>) -> u64 {
        let mut note = Note::new("seed", "Seed", "content");
        note.actions = actions;
        store.create(note).unwrap().id
    }

    fn record(hooks: &HookRegistry, event: &str) -> Arc<Mutex<Vec<ActionTaken>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        hooks.subscribe(event, move |e: &ActionTaken| {
            s.lock().unwrap().push(e.clone());
            Ok(())
        });
        seen
    }

    #[test]
    fn trigger_transitions_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let id = seed(&store, vec![action(10, "approve", NoteStatus::Actioned)]);
        let hooks = HookRegistry::new();

        let note = TriggerService::new(&store, &hooks, fast_retry(1))
            .trigger(id, 10)
            .unwrap();

        assert_eq!(note.status, NoteStatus::Actioned);
        assert_eq!(store.get(id).unwrap().unwrap().status, NoteStatus::Actioned);
    }

    #[test]
    fn every_action_sets_its_target_status() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let actions = vec![
            action(1, "approve", NoteStatus::Actioned),
            action(2, "later", NoteStatus::Snoozed),
            action(3, "reopen", NoteStatus::Unactioned),
        ];
        let id = seed(&store, actions.clone());
        let hooks = HookRegistry::new();
        let svc = TriggerService::new(&store, &hooks, fast_retry(1));

        for a in &actions {
            let note = svc.trigger(id, a.id).unwrap();
            assert_eq!(note.status, a.status);
            assert_eq!(store.get(id).unwrap().unwrap().status, a.status);
        }
    }

    #[test]
    fn second_action_wins_regardless_of_order() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let id = seed(
            &store,
            vec![
                action(11, "later", NoteStatus::Snoozed),
                action(10, "approve", NoteStatus::Actioned),
            ],
        );
        let hooks = HookRegistry::new();
        let note = TriggerService::new(&store, &hooks, fast_retry(1))
            .trigger(id, 11)
            .unwrap();
        assert_eq!(note.status, NoteStatus::Snoozed);
    }

    #[test]
    fn missing_note_is_note_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let hooks = HookRegistry::new();
        let generic = record(&hooks, NOTE_ACTION_EVENT);

        let err = TriggerService::new(&store, &hooks, fast_retry(1))
            .trigger(5, 10)
            .unwrap_err();

        assert!(matches!(err, NotesError::NoteNotFound(5)));
        assert!(generic.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_action_leaves_note_untouched() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let id = seed(&store, vec![action(10, "approve", NoteStatus::Actioned)]);
        let before = store.get(id).unwrap().unwrap();
        let hooks = HookRegistry::new();
        let generic = record(&hooks, NOTE_ACTION_EVENT);

        let err = TriggerService::new(&store, &hooks, fast_retry(1))
            .trigger(id, 99)
            .unwrap_err();

        assert!(matches!(
            err,
            NotesError::ActionNotFound {
                action_id: 99,
                ..
            }
        ));
        assert_eq!(store.get(id).unwrap().unwrap(), before);
        assert!(generic.lock().unwrap().is_empty());
    }

    #[test]
    fn fires_generic_then_qualified_event() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let id = seed(&store, vec![action(10, "approve", NoteStatus::Actioned)]);
        let hooks = HookRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for event in [NOTE_ACTION_EVENT.to_string(), action_event_name("approve")] {
            let o = order.clone();
            let tag = event.clone();
            hooks.subscribe(event, move |e: &ActionTaken| {
                assert_eq!(e.action.name, "approve");
                o.lock().unwrap().push(tag.clone());
                Ok(())
            });
        }
        let other = record(&hooks, &action_event_name("dismiss"));

        TriggerService::new(&store, &hooks, fast_retry(1))
            .trigger(id, 10)
            .unwrap();

        assert_eq!(
            *order.lock().unwrap(),
            [NOTE_ACTION_EVENT.to_string(), action_event_name("approve")]
        );
        assert!(other.lock().unwrap().is_empty());
    }

    #[test]
    fn panicking_generic_hook_still_fires_qualified_and_returns_ok() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let id = seed(&store, vec![action(10, "approve", NoteStatus::Actioned)]);
        let hooks = HookRegistry::new();
        hooks.subscribe(NOTE_ACTION_EVENT, |_| panic!("listener bug"));
        let qualified = record(&hooks, &action_event_name("approve"));

        let note = TriggerService::new(&store, &hooks, fast_retry(1))
            .trigger(id, 10)
            .unwrap();

        assert_eq!(note.status, NoteStatus::Actioned);
        assert_eq!(store.get(id).unwrap().unwrap().status, NoteStatus::Actioned);
        assert_eq!(qualified.lock().unwrap().len(), 1);
    }

    #[test]
    fn repeated_trigger_converges_but_fires_each_time() {
        let dir = TempDir::new().unwrap();
        let store = FileNoteStore::new(dir.path());
        let id = seed(&store, vec![action(10, "approve", NoteStatus::Actioned)]);
        let hooks = HookRegistry::new();
        let generic = record(&hooks, NOTE_ACTION_EVENT);
        let svc = TriggerService::new(&store, &hooks, fast_retry(1));

        let first = svc.trigger(id, 10).unwrap();
        let second = svc.trigger(id, 10).unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(generic.lock().unwrap().len(), 2);
    }

    // -----------------------------------------------------------------------
    // Persistence failures
    // -----------------------------------------------------------------------

    /// Wraps a real store and fails the first `failures` saves.
    struct FlakyStore {
        inner: FileNoteStore,
        failures: AtomicU32,
        saves: AtomicU32,
    }

    impl NoteStore for FlakyStore {
        fn get(&self, id: u64) -> Result<Option<Note>> {
            self.inner.get(id)
        }
        fn list(&self, query: &NoteQuery) -> Result<NotePage> {
            self.inner.list(query)
        }
        fn create(&self, note: Note) -> Result<Note> {
            self.inner.create(note)
        }
        fn save(&self, note: &Note) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.save(note)
        }
    }

    fn flaky(dir: &TempDir, failures: u32) -> (FlakyStore, u64) {
        let inner = FileNoteStore::new(dir.path());
        let id = seed(&inner, vec![action(10, "approve", NoteStatus::Actioned)]);
        let store = FlakyStore {
            inner,
            failures: AtomicU32::new(failures),
            saves: AtomicU32::new(0),
        };
        (store, id)
    }

    #[test]
    fn save_is_retried_until_success() {
        let dir = TempDir::new().unwrap();
        let (store, id) = flaky(&dir, 2);
        let hooks = HookRegistry::new();

        let note = TriggerService::new(&store, &hooks, fast_retry(3))
            .trigger(id, 10)
            .unwrap();

        assert_eq!(note.status, NoteStatus::Actioned);
        assert_eq!(store.saves.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhausted_retries_surface_persistence_error_without_hooks() {
        let dir = TempDir::new().unwrap();
        let (store, id) = flaky(&dir, 5);
        let hooks = HookRegistry::new();
        let generic = record(&hooks, NOTE_ACTION_EVENT);
        let qualified = record(&hooks, &action_event_name("approve"));

        let err = TriggerService::new(&store, &hooks, fast_retry(2))
            .trigger(id, 10)
            .unwrap_err();

        assert!(matches!(err, NotesError::Persistence { attempts: 2, .. }));
        assert!(generic.lock().unwrap().is_empty());
        assert!(qualified.lock().unwrap().is_empty());
        assert_eq!(
            store.get(id).unwrap().unwrap().status,
            NoteStatus::Unactioned
        );
    }
}

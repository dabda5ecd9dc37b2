use notes_core::auth::{Authorizer, RoleAuthorizer};
use notes_core::config::Config;
use notes_core::hooks::{ActionTaken, HookRegistry, NOTE_ACTION_EVENT};
use notes_core::store::{FileNoteStore, NoteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub store: Arc<dyn NoteStore>,
    pub hooks: Arc<HookRegistry>,
    pub authorizer: Arc<dyn Authorizer>,
    pub event_tx: broadcast::Sender<ActionTaken>,
}

impl AppState {
    /// File-backed store under `root` with role-based authorization.
    pub fn new(root: PathBuf, config: Config) -> Self {
        let store = Arc::new(FileNoteStore::new(root.clone()));
        Self::with_parts(root, config, store, Arc::new(RoleAuthorizer))
    }

    pub fn with_parts(
        root: PathBuf,
        config: Config,
        store: Arc<dyn NoteStore>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        let (tx, _) = broadcast::channel(64);
        let hooks = Arc::new(HookRegistry::new());

        // Every triggered action is forwarded to SSE subscribers.
        // A send error only means nobody is listening.
        let forward = tx.clone();
        hooks.subscribe(NOTE_ACTION_EVENT, move |event: &ActionTaken| {
            let _ = forward.send(event.clone());
            Ok(())
        });

        Self {
            root,
            config: Arc::new(config),
            store,
            hooks,
            authorizer,
            event_tx: tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_stores_root_and_forwards_actions() {
        let state = AppState::new(PathBuf::from("/tmp/test"), Config::default());
        assert_eq!(state.root, PathBuf::from("/tmp/test"));
        assert_eq!(state.hooks.subscriber_count(NOTE_ACTION_EVENT), 1);
    }
}

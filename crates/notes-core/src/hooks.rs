//! Named extension points for note actions.
//!
//! Subscribers register against an event name and run synchronously, in
//! registration order, whenever that event is dispatched. A subscriber that
//! errors or panics is logged and skipped; it never fails the dispatch.

use crate::note::{NoteAction, NoteStatus};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

/// Fired for every triggered action.
pub const NOTE_ACTION_EVENT: &str = "woocommerce_admin_note_action";

/// Name-qualified variant of [`NOTE_ACTION_EVENT`] for one action name.
pub fn action_event_name(action_name: &str) -> String {
    format!("{NOTE_ACTION_EVENT}:{action_name}")
}

/// Payload handed to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionTaken {
    pub note_id: u64,
    pub action: NoteAction,
    pub status: NoteStatus,
}

pub type HookError = Box<dyn std::error::Error + Send + Sync>;

type Subscriber = Arc<dyn Fn(&ActionTaken) -> Result<(), HookError> + Send + Sync>;

#[derive(Default)]
pub struct HookRegistry {
    subscribers: RwLock<HashMap<String, Vec<Subscriber>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, event: impl Into<String>, callback: F)
    where
        F: Fn(&ActionTaken) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let mut subs = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subs.entry(event.into()).or_default().push(Arc::new(callback));
    }

    /// Run every subscriber of `event`. Returns how many were invoked.
    pub fn dispatch(&self, event: &str, payload: &ActionTaken) -> usize {
        // Snapshot so subscribers may themselves subscribe without deadlocking.
        let subs: Vec<Subscriber> = {
            let map = self
                .subscribers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match map.get(event) {
                Some(list) => list.clone(),
                None => return 0,
            }
        };
        for sub in &subs {
            match catch_unwind(AssertUnwindSafe(|| sub(payload))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(event, note_id = payload.note_id, "hook subscriber failed: {e}");
                }
                Err(panic) => {
                    tracing::warn!(
                        event,
                        note_id = payload.note_id,
                        "hook subscriber panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
        subs.len()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(event)
            .map_or(0, Vec::len)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn payload() -> ActionTaken {
        ActionTaken {
            note_id: 1,
            action: NoteAction {
                id: 10,
                name: "approve".into(),
                label: "Approve".into(),
                url: None,
                status: NoteStatus::Actioned,
                primary: true,
            },
            status: NoteStatus::Actioned,
        }
    }

    #[test]
    fn qualified_event_name() {
        assert_eq!(
            action_event_name("approve"),
            "woocommerce_admin_note_action:approve"
        );
    }

    #[test]
    fn dispatch_without_subscribers_is_noop() {
        let hooks = HookRegistry::new();
        assert_eq!(hooks.dispatch(NOTE_ACTION_EVENT, &payload()), 0);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let hooks = HookRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            hooks.subscribe(NOTE_ACTION_EVENT, move |_| {
                seen.lock().unwrap().push(tag);
                Ok(())
            });
        }
        assert_eq!(hooks.dispatch(NOTE_ACTION_EVENT, &payload()), 3);
        assert_eq!(*seen.lock().unwrap(), ["first", "second", "third"]);
    }

    #[test]
    fn failing_subscriber_does_not_stop_others() {
        let hooks = HookRegistry::new();
        let ran = Arc::new(Mutex::new(false));
        hooks.subscribe(NOTE_ACTION_EVENT, |_| Err("listener broke".into()));
        let r = ran.clone();
        hooks.subscribe(NOTE_ACTION_EVENT, move |_| {
            *r.lock().unwrap() = true;
            Ok(())
        });
        assert_eq!(hooks.dispatch(NOTE_ACTION_EVENT, &payload()), 2);
        assert!(*ran.lock().unwrap());
    }

    #[test]
    fn panicking_subscriber_does_not_stop_others() {
        let hooks = HookRegistry::new();
        let ran = Arc::new(Mutex::new(false));
        hooks.subscribe(NOTE_ACTION_EVENT, |_| panic!("listener bug"));
        let r = ran.clone();
        hooks.subscribe(NOTE_ACTION_EVENT, move |_| {
            *r.lock().unwrap() = true;
            Ok(())
        });
        assert_eq!(hooks.dispatch(NOTE_ACTION_EVENT, &payload()), 2);
        assert!(*ran.lock().unwrap());
    }

    #[test]
    fn events_are_isolated_by_name() {
        let hooks = HookRegistry::new();
        hooks.subscribe(action_event_name("approve"), |_| Ok(()));
        assert_eq!(hooks.subscriber_count(&action_event_name("approve")), 1);
        assert_eq!(hooks.subscriber_count(&action_event_name("dismiss")), 0);
        assert_eq!(hooks.dispatch(&action_event_name("dismiss"), &payload()), 0);
    }
}

//! Caller identity and permission checks.
//!
//! The boundary layer resolves a [`Principal`] and asks an [`Authorizer`]
//! before calling into the store or the trigger service. The services
//! themselves assume authorization already passed.

use crate::note::Note;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Editor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub role: Role,
}

impl Principal {
    /// Identity used when no auth tokens are configured.
    pub fn local() -> Self {
        Self {
            name: "local".to_string(),
            role: Role::Editor,
        }
    }
}

pub trait Authorizer: Send + Sync {
    fn can_read(&self, principal: &Principal) -> bool;

    /// Checked before updating a note or triggering one of its actions.
    fn can_edit(&self, principal: &Principal, note: &Note) -> bool;
}

/// Viewers read, editors read and mutate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn can_read(&self, _principal: &Principal) -> bool {
        true
    }

    fn can_edit(&self, principal: &Principal, _note: &Note) -> bool {
        principal.role == Role::Editor
    }
}

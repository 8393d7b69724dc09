//! Shared identifiers, actor identity, and traits for rewards entities.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a kid. Kids are users, so this doubles as the notification target.
pub type KidId = Uuid;

/// Identifier of any user acting on the ledger (kid, guardian, or system job).
pub type UserId = Uuid;

/// Exposes a stable identifier for entities stored in the ledger.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Raised when a persisted label does not match any known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Role of the caller as reported by the identity collaborator.
pub enum ActorRole {
    Kid,
    Guardian,
    System,
}

labelled_enum!(ActorRole, "actor role", {
    Kid => "Kid",
    Guardian => "Guardian",
    System => "System",
});

/// The already-authorized caller of a core operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: ActorRole,
}

impl Actor {
    pub fn kid(user_id: UserId) -> Self {
        Self {
            user_id,
            role: ActorRole::Kid,
        }
    }

    pub fn guardian(user_id: UserId) -> Self {
        Self {
            user_id,
            role: ActorRole::Guardian,
        }
    }

    /// Scheduled jobs act as the nil user.
    pub fn system() -> Self {
        Self {
            user_id: Uuid::nil(),
            role: ActorRole::System,
        }
    }
}

//! Boundary to the external notification dispatcher.

use kidledger_domain::{KidId, ReminderTrack};
use thiserror::Error;

/// One reminder handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub kid_user_id: KidId,
    pub title: String,
    pub body: String,
    pub kind: ReminderTrack,
    pub link_url: String,
    /// Derived from `(date, time, track)`; the run log already prevents repeats.
    pub dedupe_key: String,
}

#[derive(Debug, Clone, Error)]
#[error("notification dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Delivers reminders. Implementations own the transport.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &ReminderNotification) -> Result<(), DispatchError>;
}

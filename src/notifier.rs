use kidledger_core::{DispatchError, Notifier, ReminderNotification};
use tracing::info;

/// Notifier that records reminders in the log instead of delivering them.
///
/// Delivery transport lives outside this crate; the jobs binary uses this so a
/// sweep still leaves a trace of what would have been sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, notification: &ReminderNotification) -> Result<(), DispatchError> {
        info!(
            kid_id = %notification.kid_user_id,
            kind = %notification.kind,
            title = %notification.title,
            body = %notification.body,
            link = %notification.link_url,
            dedupe_key = %notification.dedupe_key,
            "reminder notification"
        );
        Ok(())
    }
}

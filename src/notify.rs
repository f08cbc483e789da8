//! Notification side effects for executed transitions.
//!
//! Notifications are strictly best-effort: the executor fires them after the
//! database transaction commits, and a failing notifier is logged and
//! swallowed, never surfaced to the caller. The trait is the seam where a
//! real mail sender would plug in.

use tracing::info;

/// What downstream observers learn about one executed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent<'a> {
    /// The process that advanced
    pub process_id: i64,
    /// The audit step that was written
    pub step_id: i64,
    /// Key of the executed transition
    pub transition_key: &'a str,
    /// Display label of the executed transition
    pub transition_label: &'a str,
    /// Node the process arrived at
    pub node_key_to: &'a str,
    /// Username of whoever executed it
    pub performed_by: &'a str,
    /// Teams the workflow addresses for this transition
    pub destination_team_ids: &'a [i64],
}

/// A best-effort observer of executed transitions.
pub trait Notifier: Send + Sync {
    /// Delivers one event. Errors are reported as strings because the
    /// executor only ever logs them.
    fn notify(&self, event: &NotificationEvent<'_>) -> Result<(), String>;
}

/// The default notifier: writes the event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &NotificationEvent<'_>) -> Result<(), String> {
        info!(
            process_id = event.process_id,
            step_id = event.step_id,
            transition = event.transition_key,
            node_key_to = event.node_key_to,
            performed_by = event.performed_by,
            destination_teams = ?event.destination_team_ids,
            "budget transition executed"
        );
        Ok(())
    }
}

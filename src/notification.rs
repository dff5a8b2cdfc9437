use crate::session::SearchSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

pub const DELETE_SUCCESS_MSG: &str = "Document deleted successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    #[default]
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autohide_secs: Option<u64>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            autohide_secs: None,
        }
    }

    pub fn with_autohide(mut self, secs: u64) -> Self {
        self.autohide_secs = Some(secs);
        self
    }
}

/// Single-slot message board shared by the whole process.
///
/// Showing a message replaces whatever was there, acknowledged or not.
#[derive(Debug, Clone)]
pub struct NotificationChannel {
    slot: Arc<watch::Sender<Option<Notification>>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }

    pub fn show(&self, notification: Notification) {
        tracing::debug!("notification [{}]: {}", notification.severity, notification.message);
        self.slot.send_replace(Some(notification));
    }

    /// The message currently displayed, if any
    pub fn current(&self) -> Option<Notification> {
        self.slot.borrow().clone()
    }

    /// Acknowledge and remove the current message
    pub fn consume(&self) -> Option<Notification> {
        self.slot.send_replace(None)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.slot.subscribe()
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward the session's one-shot feedback flags to the channel and consume them
pub fn relay_session_feedback(session: &SearchSession, channel: &NotificationChannel) {
    if let Some(err) = session.take_err() {
        channel.show(Notification::new(err, Severity::Error));
    }

    if session.take_delete_success() {
        channel.show(Notification::new(DELETE_SUCCESS_MSG, Severity::Info));
    }
}

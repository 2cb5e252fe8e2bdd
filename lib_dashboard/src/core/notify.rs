//! # Notifications
//!
//! The core decides *what* the user should be told and at which level; how a
//! notification is shown (toast, console line, sound) belongs to whoever
//! subscribes to the `NotificationHub`.

use std::fmt;

use tokio::sync::broadcast;

use crate::core::model::{OrderEvent, OrderStatus};

/// Severity/category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Something completed.
    Success,
    /// Informational, e.g. a command was accepted.
    Info,
    /// Dropped data or degraded state.
    Warning,
    /// A failure the user should know about.
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Category.
    pub level: NotificationLevel,
    /// Text to show.
    pub message: String,
}

impl Notification {
    /// Builds a notification of the given level.
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Success-level notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// Info-level notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    /// Warning-level notification.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    /// Error-level notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }
}

/// Maps order outcomes to notifications.
pub struct NotificationClassifier;

impl NotificationClassifier {
    /// SUCCESS becomes a success notification, FAILED an error notification
    /// that carries the reason when the pipeline sent one.
    pub fn classify(event: &OrderEvent) -> Notification {
        match event.status {
            OrderStatus::Success => Notification::success(format!("Order {}... processed!", event.short_id())),
            OrderStatus::Failed => {
                let mut message = format!("Order {}... failed!", event.short_id());
                if let Some(reason) = event.reason.as_deref().filter(|r| !r.is_empty()) {
                    message.push_str(" Reason: ");
                    message.push_str(reason);
                }
                Notification::error(message)
            }
        }
    }
}

/// Fan-out of notifications to any number of presenters.
///
/// Publishing never blocks; a presenter that falls more than the channel
/// capacity behind loses the oldest notifications.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    /// Creates a hub buffering up to `capacity` notifications per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends `notification` to every current subscriber.
    pub fn publish(&self, notification: Notification) {
        log::debug!("Notification [{}]: {}", notification.level, notification.message);
        // No subscriber is fine: nothing is rendering yet.
        let _ = self.sender.send(notification);
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

//! Transient notifications
//!
//! A single slot with a dismissal deadline. Showing a new message replaces
//! the pending one together with its deadline, so an earlier dismissal can
//! never hide a later message.

use chrono::{DateTime, Duration, Utc};

/// How long a notification stays up
pub const DISPLAY_SECONDS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Notifier {
    current: Option<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a message, replacing any pending one
    pub fn show(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.current = Some(Notification {
            message: message.into(),
            expires_at: now + Duration::seconds(DISPLAY_SECONDS),
        });
    }

    /// The message visible at `now`, if any
    pub fn visible(&self, now: DateTime<Utc>) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|n| now < n.expires_at)
            .map(|n| n.message.as_str())
    }

    /// Drop an expired notification
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.visible(now).is_none() {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

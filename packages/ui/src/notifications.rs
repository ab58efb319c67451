//! Transient user-facing messages ("toasts").
//!
//! A notification is visible for the configured display time and is dropped
//! once it has expired. Id dedupe only applies among visible notifications.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use store::Clock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Set for messages that must not be shown twice at once.
    pub id: Option<String>,
    pub level: Level,
    pub message: String,
    pub at_ms: i64,
}

/// Shared notification queue. Clones share entries.
#[derive(Clone)]
pub struct Notifications {
    entries: Arc<Mutex<Vec<Notification>>>,
    clock: Arc<dyn Clock>,
    display_ms: i64,
}

impl Notifications {
    pub fn new(clock: Arc<dyn Clock>, display_ms: i64) -> Self {
        Self {
            entries: Arc::default(),
            clock,
            display_ms,
        }
    }

    pub fn push(&self, level: Level, message: impl Into<String>) {
        self.insert(None, level, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    /// Push unless a notification with `id` is still showing.
    /// Returns whether it was added.
    pub fn push_once(&self, id: &str, level: Level, message: impl Into<String>) -> bool {
        if self.entries().iter().any(|n| n.id.as_deref() == Some(id)) {
            return false;
        }
        self.insert(Some(id.to_string()), level, message.into());
        true
    }

    fn insert(&self, id: Option<String>, level: Level, message: String) {
        match level {
            Level::Error | Level::Warning => tracing::warn!(%message, "notify"),
            Level::Info | Level::Success => tracing::debug!(%message, "notify"),
        }
        let at_ms = self.clock.now_ms();
        self.entries().push(Notification {
            id,
            level,
            message,
            at_ms,
        });
    }

    /// The notifications still visible.
    pub fn entries(&self) -> MutexGuard<'_, Vec<Notification>> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|n| now - n.at_ms < self.display_ms);
        entries
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().iter().map(|n| n.message.clone()).collect()
    }

    pub fn dismiss(&self, id: &str) {
        self.entries().retain(|n| n.id.as_deref() != Some(id));
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl std::fmt::Debug for Notifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifications")
            .field("entries", &*self.entries())
            .finish()
    }
}

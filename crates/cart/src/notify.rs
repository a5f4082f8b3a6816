//! Shopper-facing notices.

use std::sync::{Mutex, PoisonError};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Whether the shopper can close it.
    pub dismissable: bool,
}

impl Notice {
    /// An informational notice that closes on its own.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            dismissable: false,
        }
    }

    /// A dismissable warning.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            dismissable: true,
        }
    }

    /// A dismissable error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            dismissable: true,
        }
    }
}

/// Receives notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits notices as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(notice = %notice.message, "Cart notice"),
            NoticeLevel::Warning => tracing::warn!(notice = %notice.message, "Cart notice"),
            NoticeLevel::Error => tracing::error!(notice = %notice.message, "Cart notice"),
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_dismissable() {
        assert!(Notice::error("nope").dismissable);
        assert!(!Notice::info("added").dismissable);
    }

    #[test]
    fn test_recording_notifier_keeps_order() {
        let recorder = RecordingNotifier::new();
        recorder.notify(Notice::info("one"));
        recorder.notify(Notice::error("two"));

        let notices = recorder.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].level, NoticeLevel::Error);
    }
}

//! Transient user notices
//!
//! Every gallery operation publishes one [`Notice`] describing its outcome.
//! Views subscribe and render them as toasts; nobody listening is fine.

use crate::error::{FailureClass, GalleryError};
use serde::Serialize;
use tokio::sync::broadcast;

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Operation applied
    Success,
    /// Operation failed, state unchanged
    Error,
}

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity
    pub severity: Severity,
    /// Headline
    pub title: String,
    /// Body text
    pub description: String,
}

impl Notice {
    /// Success notice
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Failure notice; `what` completes "Failed to ..." (e.g. `"delete the image"`)
    #[must_use]
    pub fn failure(what: &str, error: &GalleryError) -> Self {
        let description = match error.class() {
            FailureClass::StoragePath => {
                format!("Failed to {what}: its storage location is unknown.")
            }
            FailureClass::Permission => format!("You are not allowed to {what}."),
            FailureClass::Validation => match error.validation_message() {
                Some(msg) => format!("Failed to {what}: {msg}."),
                None => format!("Failed to {what}: the input was rejected."),
            },
            FailureClass::NotFound => format!("Failed to {what}: it no longer exists."),
            FailureClass::PartialDelete => {
                format!("Failed to {what} completely. Please try again.")
            }
            FailureClass::Network | FailureClass::Backend | FailureClass::Closed => {
                format!("Failed to {what}. Please try again.")
            }
        };
        Self {
            severity: Severity::Error,
            title: "Error".to_string(),
            description,
        }
    }
}

/// Fan-out of notices to any number of subscribers
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    sender: broadcast::Sender<Notice>,
}

impl NoticeBoard {
    /// Create board buffering `capacity` notices per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future notices
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Publish a notice
    pub fn publish(&self, notice: Notice) {
        // No receivers is not an error
        let _ = self.sender.send(notice);
    }
}

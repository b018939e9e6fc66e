//! Error types for the gallery core
//!
//! Provides error handling for:
//! - Backend (record/asset store) failures
//! - Asset locator resolution
//! - Gallery operations (permission, validation, teardown)
//! - The upload flow
//! - Configuration loading

use crate::types::ItemId;

/// Any failure reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Caller lacks permission
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Backend rejected the payload
    #[error("validation failed: {0}")]
    Validation(String),

    /// Record or asset does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Anything else the backend reports
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if a later attempt could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Backend(_))
    }
}

/// An asset locator that does not point into the configured bucket
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not resolve storage path from {url}")]
pub struct NotResolvable {
    /// The offending locator
    pub url: String,
}

/// Gallery operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GalleryError {
    /// Backend call failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Asset path could not be derived for deletion
    #[error(transparent)]
    NotResolvable(#[from] NotResolvable),

    /// Principal may not modify this item
    #[error("not permitted to modify item {0}")]
    Forbidden(ItemId),

    /// Rejected before reaching the backend
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No item with this ID in the list
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// Asset was deleted but its record was not
    #[error("asset for {id} deleted but record delete failed: {source}")]
    RecordDeleteFailed {
        /// Affected item
        id: ItemId,
        /// Record delete failure
        source: StoreError,
    },

    /// Gallery was torn down before the response arrived
    #[error("gallery closed")]
    Closed,
}

impl GalleryError {
    /// Check if retrying the same operation could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) | Self::RecordDeleteFailed { source: e, .. } => e.is_retryable(),
            _ => false,
        }
    }

    /// Failure class shown to the user
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Store(StoreError::Network(_)) => FailureClass::Network,
            Self::Store(StoreError::Unauthorized(_)) | Self::Forbidden(_) => FailureClass::Permission,
            Self::Store(StoreError::Validation(_)) | Self::InvalidInput(_) => FailureClass::Validation,
            Self::Store(StoreError::NotFound(_)) | Self::UnknownItem(_) => FailureClass::NotFound,
            Self::Store(StoreError::Backend(_)) => FailureClass::Backend,
            Self::NotResolvable(_) => FailureClass::StoragePath,
            Self::RecordDeleteFailed { .. } => FailureClass::PartialDelete,
            Self::Closed => FailureClass::Closed,
        }
    }

    /// Rejection reason for validation failures
    #[must_use]
    pub fn validation_message(&self) -> Option<&str> {
        match self {
            Self::InvalidInput(msg) | Self::Store(StoreError::Validation(msg)) => Some(msg),
            _ => None,
        }
    }
}

/// Coarse failure classes for user-facing notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Backend unreachable
    Network,
    /// Principal lacks permission
    Permission,
    /// Input rejected
    Validation,
    /// Target no longer exists
    NotFound,
    /// Backend failed internally
    Backend,
    /// Asset locator has no storage path
    StoragePath,
    /// Asset deleted, record kept
    PartialDelete,
    /// Gallery torn down
    Closed,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Network => "network",
            Self::Permission => "permission",
            Self::Validation => "validation",
            Self::NotFound => "not found",
            Self::Backend => "backend",
            Self::StoragePath => "storage path",
            Self::PartialDelete => "partial delete",
            Self::Closed => "closed",
        })
    }
}

/// Upload flow errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Only signed-in users may upload
    #[error("you must be logged in to upload images")]
    NotAuthenticated,

    /// No file bytes supplied
    #[error("please select an image to upload")]
    MissingFile,

    /// Content type is not image/*
    #[error("please select an image file (got {0})")]
    NotAnImage(String),

    /// Other rejected input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Backend call failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

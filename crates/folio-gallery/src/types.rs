//! Core types for the gallery
//!
//! Defines:
//! - Item and user identifiers
//! - Gallery items and new-item payloads
//! - The acting principal
//! - Snapshots handed to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque item identifier assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create item ID from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random ID (used by in-process stores)
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create user ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single gallery entry
///
/// Items are ordered by `created_at` descending. Only `title` and
/// `description` ever change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    /// Backend-assigned identity
    pub id: ItemId,
    /// Display title (never empty)
    pub title: String,
    /// Optional caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Locator of the image asset
    pub url: String,
    /// Creation time, the sole sort key
    pub created_at: DateTime<Utc>,
    /// Creator, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
}

impl GalleryItem {
    /// Create item with required fields
    #[inline]
    #[must_use]
    pub fn new(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            url: url.into(),
            created_at,
            owner_id: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = normalize_description(Some(description.into()));
        self
    }

    /// With owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<UserId>) -> Self {
        self.owner_id = Some(owner.into());
        self
    }
}

/// Payload for creating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Display title
    pub title: String,
    /// Optional caption
    pub description: Option<String>,
    /// Public locator of the uploaded asset
    pub url: String,
    /// Uploading user
    pub owner_id: UserId,
}

/// The user attempting an action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Principal {
    /// Not signed in
    #[default]
    Anonymous,
    /// Signed in as the given user
    Authenticated(UserId),
}

impl Principal {
    /// Authenticated principal
    #[inline]
    #[must_use]
    pub fn user(id: impl Into<UserId>) -> Self {
        Self::Authenticated(id.into())
    }

    /// Check if signed in
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Signed-in user, if any
    #[inline]
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Authenticated(id) => Some(id),
            Self::Anonymous => None,
        }
    }
}

/// Point-in-time copy of gallery state for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GallerySnapshot {
    /// Items in display order
    pub items: Vec<GalleryItem>,
    /// Next page to fetch
    pub page_index: usize,
    /// Whether more pages may exist
    pub has_more: bool,
    /// Whether a page fetch is in flight
    pub is_loading: bool,
    /// Item shown in the detail overlay
    pub selected: Option<GalleryItem>,
}

/// Treat blank captions as absent
pub(crate) fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

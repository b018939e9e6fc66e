//! Backend seam
//!
//! The gallery only issues logical operations through [`GalleryStore`];
//! transport, credentials and bucket layout belong to the implementation.

use crate::error::StoreError;
use crate::types::{GalleryItem, ItemId, NewItem};

/// Record and asset store consumed by the gallery
///
/// Implement this trait to back a gallery with a hosted service, a database
/// or an in-process store.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GalleryStore: Send + Sync {
    /// Fetch up to `limit` items starting at `offset`, newest first
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<GalleryItem>, StoreError>;

    /// Total number of records
    async fn count(&self) -> Result<usize, StoreError>;

    /// Create a record; the backend assigns `id` and `created_at`
    async fn insert(&self, item: NewItem) -> Result<GalleryItem, StoreError>;

    /// Replace title and description of a record
    async fn update(
        &self,
        id: &ItemId,
        title: &str,
        description: Option<String>,
    ) -> Result<(), StoreError>;

    /// Store asset bytes at `path` inside the gallery bucket
    async fn upload_asset(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Public locator for an asset path
    fn public_url(&self, path: &str) -> String;

    /// Remove an asset
    async fn delete_asset(&self, path: &str) -> Result<(), StoreError>;

    /// Remove a record
    async fn delete_record(&self, id: &ItemId) -> Result<(), StoreError>;
}

//! Upload flow
//!
//! Stores the image bytes under a per-user path, then records the public
//! URL. The gallery only learns about the new item once the record exists.

use crate::error::UploadError;
use crate::store::GalleryStore;
use crate::types::{normalize_description, GalleryItem, NewItem, Principal};
use std::sync::Arc;

/// An image the user wants to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Display title
    pub title: String,
    /// Optional caption
    pub description: String,
    /// Original file name, used for the extension
    pub file_name: String,
    /// MIME type reported for the file
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    /// Create request
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Publishes images through a [`GalleryStore`]
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn GalleryStore>,
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader").finish_non_exhaustive()
    }
}

impl Uploader {
    /// Create uploader
    #[must_use]
    pub fn new(store: Arc<dyn GalleryStore>) -> Self {
        Self { store }
    }

    /// Validate, store the asset, then insert the record
    ///
    /// # Errors
    /// - `UploadError::NotAuthenticated` for anonymous principals
    /// - `UploadError::MissingFile` / `NotAnImage` / `InvalidInput` for bad input
    /// - `UploadError::Store` if either backend call fails
    pub async fn upload(
        &self,
        principal: &Principal,
        request: UploadRequest,
    ) -> Result<GalleryItem, UploadError> {
        let owner = principal.user_id().ok_or(UploadError::NotAuthenticated)?.clone();
        if request.bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if !request.content_type.starts_with("image/") {
            return Err(UploadError::NotAnImage(request.content_type));
        }
        if request.title.trim().is_empty() {
            return Err(UploadError::InvalidInput("title must not be empty".to_string()));
        }

        let path = storage_path(owner.as_str(), &request.file_name);
        self.store
            .upload_asset(&path, request.bytes, &request.content_type)
            .await?;
        let url = self.store.public_url(&path);
        tracing::debug!("Uploaded asset {}", path);

        let item = self
            .store
            .insert(NewItem {
                title: request.title,
                description: normalize_description(Some(request.description)),
                url,
                owner_id: owner,
            })
            .await?;
        tracing::info!("Published item {} at {}", item.id, path);
        Ok(item)
    }
}

/// `{user}/{user}-{random}.{ext}`, the extension taken from the file name
fn storage_path(user: &str, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
        .to_ascii_lowercase();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{user}/{user}-{}.{ext}", &random[..12])
}

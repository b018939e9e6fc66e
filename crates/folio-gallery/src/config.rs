//! Gallery configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Items fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Fraction of the sentinel that must be visible to request a page
pub const DEFAULT_SENTINEL_THRESHOLD: f64 = 0.1;

/// Gallery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Items per page
    pub page_size: usize,
    /// Sentinel visibility ratio that triggers a load
    pub sentinel_threshold: f64,
    /// Object storage bucket holding gallery assets
    pub bucket: String,
    /// Path prefix of public object URLs, before the bucket segment
    pub public_prefix: String,
    /// Origin used when building public URLs
    pub public_base_url: String,
    /// Buffered notices per subscriber
    pub notice_capacity: usize,
}

impl GalleryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// With sentinel threshold
    #[inline]
    #[must_use]
    pub fn with_sentinel_threshold(mut self, threshold: f64) -> Self {
        self.sentinel_threshold = threshold;
        self
    }

    /// With bucket name
    #[inline]
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// With public base URL
    #[inline]
    #[must_use]
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = base.into();
        self
    }

    /// Parse from a TOML string and validate
    ///
    /// # Errors
    /// `ConfigError::Parse` for malformed TOML, `ConfigError::Invalid` for bad values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// As [`from_toml_str`](Self::from_toml_str), plus `ConfigError::Io`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!("Loaded gallery config from {}", path.display());
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".to_string()));
        }
        if !(self.sentinel_threshold > 0.0 && self.sentinel_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "sentinel_threshold must be in (0, 1], got {}",
                self.sentinel_threshold
            )));
        }
        if self.bucket.is_empty() || self.bucket.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "bucket must be a single path segment, got {:?}",
                self.bucket
            )));
        }
        if self.notice_capacity == 0 {
            return Err(ConfigError::Invalid("notice_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// Full path prefix preceding a storage path, with trailing slash
    #[must_use]
    pub fn object_prefix(&self) -> String {
        format!("{}/{}/", self.public_prefix.trim_end_matches('/'), self.bucket)
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            sentinel_threshold: DEFAULT_SENTINEL_THRESHOLD,
            bucket: "images".to_string(),
            public_prefix: "/storage/v1/object/public".to_string(),
            public_base_url: "http://localhost:54321".to_string(),
            notice_capacity: 32,
        }
    }
}

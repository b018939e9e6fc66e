//! Folio Gallery - paged portfolio gallery core
//!
//! Keeps an in-memory, newest-first list of gallery items consistent with
//! a backend record/asset store:
//! - Incremental loading, one page in flight at a time
//! - Edit and delete applied only after the backend confirms
//! - Per-item edit permission for the signed-in user
//! - Upload of new images through the same store
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_gallery::{GalleryConfig, PagedGallery, Principal};
//!
//! # async fn example(store: std::sync::Arc<dyn folio_gallery::GalleryStore>) -> Result<(), folio_gallery::GalleryError> {
//! let gallery = PagedGallery::open(store, Principal::user("u1"), GalleryConfig::new()).await?;
//! gallery.load_next_page().await?;
//!
//! println!("{} items loaded", gallery.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod asset;
pub mod config;
pub mod error;
pub mod gallery;
pub mod notice;
pub mod policy;
pub mod sentinel;
pub mod store;
pub mod types;
pub mod upload;

pub use asset::{asset_public_url, resolve_asset_path};
pub use config::{GalleryConfig, DEFAULT_PAGE_SIZE, DEFAULT_SENTINEL_THRESHOLD};
pub use error::{ConfigError, FailureClass, GalleryError, NotResolvable, StoreError, UploadError};
pub use gallery::{LoadOutcome, PagedGallery, RetryReport, SkipReason};
pub use notice::{Notice, NoticeBoard, Severity};
pub use policy::can_edit;
pub use sentinel::{drive_sentinel, Sentinel};
pub use store::GalleryStore;
pub use types::{GalleryItem, GallerySnapshot, ItemId, NewItem, Principal, UserId};
pub use upload::{UploadRequest, Uploader};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the gallery
    pub use crate::{
        GalleryConfig, GalleryError, GalleryItem, GalleryStore, ItemId, LoadOutcome,
        PagedGallery, Principal, StoreError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

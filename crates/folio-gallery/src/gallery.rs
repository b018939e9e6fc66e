//! Paged gallery
//!
//! Owns the in-memory item list and keeps it consistent with the backend:
//! - Incremental page loading guarded by a single in-flight fetch
//! - Selection for the detail overlay
//! - Edit and delete applied only after the backend confirms
//!
//! State sits behind a mutex that is never held across an `.await`, so a
//! gallery shared through `Arc` can run an edit or delete while a page load
//! is in flight. Mutations are keyed by item ID, never by position.

use crate::asset::resolve_asset_path;
use crate::config::GalleryConfig;
use crate::error::{GalleryError, StoreError};
use crate::notice::{Notice, NoticeBoard};
use crate::policy;
use crate::store::GalleryStore;
use crate::types::{normalize_description, GalleryItem, GallerySnapshot, ItemId, Principal};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Why a load request did not reach the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A fetch is already in flight
    Loading,
    /// The last page has been seen
    Exhausted,
}

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and appended
    Appended {
        /// Items actually added (duplicates skipped)
        added: usize,
        /// Whether another page may exist
        has_more: bool,
    },
    /// The backend returned an empty page
    Exhausted,
    /// Nothing was fetched
    Skipped(SkipReason),
}

/// Result of retrying record deletes left behind by partial deletes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
    /// Records now deleted and removed from the list
    pub removed: Vec<ItemId>,
    /// Records still pending
    pub failed: Vec<(ItemId, StoreError)>,
}

#[derive(Debug, Clone)]
struct GalleryState {
    items: Vec<GalleryItem>,
    page_index: usize,
    has_more: bool,
    is_loading: bool,
    selected: Option<GalleryItem>,
    /// Items whose asset is gone but whose record survived
    pending_record_deletes: Vec<ItemId>,
}

impl GalleryState {
    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Append items in order, skipping IDs already present
    fn append_unique(&mut self, page: Vec<GalleryItem>) -> usize {
        let mut seen: HashSet<ItemId> = self.items.iter().map(|i| i.id.clone()).collect();
        let before = self.items.len();
        for item in page {
            if seen.insert(item.id.clone()) {
                self.items.push(item);
            } else {
                tracing::warn!("Skipping duplicate item {} from page", item.id);
            }
        }
        self.items.len() - before
    }

    fn remove(&mut self, id: &ItemId) {
        self.items.retain(|item| &item.id != id);
        if self.selected.as_ref().is_some_and(|s| &s.id == id) {
            self.selected = None;
        }
        self.pending_record_deletes.retain(|pending| pending != id);
    }
}

/// Resets `is_loading` when a fetch ends, including when its future is dropped
struct LoadingGuard<'a> {
    state: &'a Mutex<GalleryState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().is_loading = false;
    }
}

/// Client-side paged list with server-authoritative mutations
pub struct PagedGallery {
    store: Arc<dyn GalleryStore>,
    principal: Principal,
    config: GalleryConfig,
    state: Mutex<GalleryState>,
    closed: AtomicBool,
    notices: NoticeBoard,
}

impl std::fmt::Debug for PagedGallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedGallery")
            .field("principal", &self.principal)
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl PagedGallery {
    /// Create gallery from a pre-fetched first page
    ///
    /// # Arguments
    /// * `store` - Backend the gallery issues operations against
    /// * `principal` - User on whose behalf mutations are made
    /// * `config` - Page size, bucket layout, notice capacity
    /// * `initial_page` - Page 0, newest first
    /// * `total_count` - Total records at the time page 0 was fetched
    #[must_use]
    pub fn new(
        store: Arc<dyn GalleryStore>,
        principal: Principal,
        config: GalleryConfig,
        initial_page: Vec<GalleryItem>,
        total_count: usize,
    ) -> Self {
        let mut state = GalleryState {
            items: Vec::with_capacity(initial_page.len()),
            page_index: 1,
            has_more: false,
            is_loading: false,
            selected: None,
            pending_record_deletes: Vec::new(),
        };
        state.append_unique(initial_page);
        state.has_more = state.items.len() < total_count;

        Self {
            store,
            principal,
            notices: NoticeBoard::new(config.notice_capacity),
            config,
            state: Mutex::new(state),
            closed: AtomicBool::new(false),
        }
    }

    /// Fetch page 0 and the total count, then build the gallery
    ///
    /// # Errors
    /// Returns the store error if either request fails.
    pub async fn open(
        store: Arc<dyn GalleryStore>,
        principal: Principal,
        config: GalleryConfig,
    ) -> Result<Self, GalleryError> {
        let first = store.list_page(0, config.page_size).await?;
        let total = store.count().await?;
        tracing::info!("Opened gallery: {} of {} items on first page", first.len(), total);
        Ok(Self::new(store, principal, config, first, total))
    }

    /// Load the next page
    ///
    /// No-op unless no fetch is in flight and more pages may exist. A short
    /// or empty page marks the list exhausted for good.
    ///
    /// # Errors
    /// - `GalleryError::Store` if the fetch fails; state is unchanged
    /// - `GalleryError::Closed` if the gallery was closed
    pub async fn load_next_page(&self) -> Result<LoadOutcome, GalleryError> {
        self.ensure_open()?;

        let (offset, limit) = {
            let mut state = self.state.lock();
            if state.is_loading {
                tracing::debug!("Load skipped: fetch in flight");
                return Ok(LoadOutcome::Skipped(SkipReason::Loading));
            }
            if !state.has_more {
                tracing::debug!("Load skipped: no more pages");
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            state.is_loading = true;
            (state.page_index * self.config.page_size, self.config.page_size)
        };
        let _loading = LoadingGuard { state: &self.state };

        let result = self.store.list_page(offset, limit).await;
        self.ensure_live("page load")?;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Loading page at offset {} failed: {}", offset, e);
                let err = GalleryError::from(e);
                self.notices.publish(Notice::failure("load more images", &err));
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        if page.is_empty() {
            state.has_more = false;
            tracing::info!("Gallery exhausted at offset {}", offset);
            return Ok(LoadOutcome::Exhausted);
        }

        let returned = page.len();
        let added = state.append_unique(page);
        state.page_index += 1;
        state.has_more = state.has_more && returned == limit;
        tracing::info!(
            "Loaded page {} ({} items, {} total, has_more={})",
            state.page_index - 1,
            added,
            state.items.len(),
            state.has_more
        );

        Ok(LoadOutcome::Appended {
            added,
            has_more: state.has_more,
        })
    }

    /// Show an item in the detail overlay
    pub fn select(&self, item: GalleryItem) {
        self.state.lock().selected = Some(item);
    }

    /// Select an item from the list by ID
    ///
    /// # Errors
    /// `GalleryError::UnknownItem` if no such item is loaded.
    pub fn select_by_id(&self, id: &ItemId) -> Result<(), GalleryError> {
        let mut state = self.state.lock();
        let idx = state
            .position(id)
            .ok_or_else(|| GalleryError::UnknownItem(id.clone()))?;
        state.selected = Some(state.items[idx].clone());
        Ok(())
    }

    /// Close the detail overlay
    pub fn clear_selection(&self) {
        self.state.lock().selected = None;
    }

    /// Check if the current principal may edit or delete `item`
    #[must_use]
    pub fn can_edit(&self, item: &GalleryItem) -> bool {
        policy::can_edit(&self.principal, item)
    }

    /// Replace title and description of an item
    ///
    /// The item keeps its identity and position. A blank description clears
    /// it.
    ///
    /// # Errors
    /// - `GalleryError::InvalidInput` for a blank title
    /// - `GalleryError::UnknownItem` / `GalleryError::Forbidden` before any
    ///   backend call
    /// - `GalleryError::Store` if the update fails; state is unchanged
    pub async fn apply_edit(
        &self,
        id: &ItemId,
        title: &str,
        description: &str,
    ) -> Result<(), GalleryError> {
        let result = self.edit_inner(id, title, description).await;
        match &result {
            Ok(()) => self.notices.publish(Notice::success(
                "Image updated",
                "The image details have been successfully updated.",
            )),
            Err(GalleryError::Closed) => {}
            Err(e) => {
                tracing::error!("Updating item {} failed: {}", id, e);
                self.notices.publish(Notice::failure("update the image", e));
            }
        }
        result
    }

    async fn edit_inner(&self, id: &ItemId, title: &str, description: &str) -> Result<(), GalleryError> {
        self.ensure_open()?;
        if title.trim().is_empty() {
            return Err(GalleryError::InvalidInput("title must not be empty".to_string()));
        }
        self.authorize(id)?;

        let description = normalize_description(Some(description.to_string()));
        self.store.update(id, title, description.clone()).await?;
        self.ensure_live("update")?;

        let mut state = self.state.lock();
        if let Some(idx) = state.position(id) {
            let item = &mut state.items[idx];
            item.title = title.to_string();
            item.description.clone_from(&description);
        }
        if let Some(selected) = state.selected.as_mut().filter(|s| &s.id == id) {
            selected.title = title.to_string();
            selected.description = description;
        }
        tracing::info!("Updated item {}", id);
        Ok(())
    }

    /// Delete an item's asset, then its record, then drop it from the list
    ///
    /// The record delete is never attempted if the asset delete fails. If the
    /// asset is gone but the record delete fails, the item stays listed and
    /// is queued for [`retry_pending_deletes`](Self::retry_pending_deletes);
    /// deleting it again skips straight to the record.
    ///
    /// # Errors
    /// - `GalleryError::NotResolvable` if the URL has no storage path
    /// - `GalleryError::Store` if the asset delete fails
    /// - `GalleryError::RecordDeleteFailed` if only the record delete fails
    pub async fn apply_delete(&self, id: &ItemId) -> Result<(), GalleryError> {
        let result = self.delete_inner(id).await;
        match &result {
            Ok(()) => self.notices.publish(Notice::success(
                "Image deleted",
                "The image has been successfully deleted.",
            )),
            Err(GalleryError::Closed) => {}
            Err(e) => {
                tracing::error!("Deleting item {} failed: {}", id, e);
                self.notices.publish(Notice::failure("delete the image", e));
            }
        }
        result
    }

    async fn delete_inner(&self, id: &ItemId) -> Result<(), GalleryError> {
        self.ensure_open()?;
        let item = self.authorize(id)?;

        // A repeated delete after a partial one only needs the record step
        let asset_gone = self.state.lock().pending_record_deletes.contains(id);
        if asset_gone {
            tracing::debug!("Asset for item {} already deleted, retrying record", id);
        } else {
            let path = resolve_asset_path(&item.url, &self.config)?;
            self.store.delete_asset(&path).await?;
            tracing::debug!("Deleted asset {} for item {}", path, id);
        }

        if let Err(source) = self.store.delete_record(id).await {
            let mut state = self.state.lock();
            if !state.pending_record_deletes.contains(id) {
                state.pending_record_deletes.push(id.clone());
            }
            return Err(GalleryError::RecordDeleteFailed {
                id: id.clone(),
                source,
            });
        }
        self.ensure_live("delete")?;

        self.state.lock().remove(id);
        tracing::info!("Deleted item {}", id);
        Ok(())
    }

    /// Re-issue record deletes whose asset is already gone
    ///
    /// Failures are collected in the report rather than returned.
    ///
    /// # Errors
    /// `GalleryError::Closed` if the gallery was closed before or during the retry.
    pub async fn retry_pending_deletes(&self) -> Result<RetryReport, GalleryError> {
        self.ensure_open()?;
        let pending = self.state.lock().pending_record_deletes.clone();

        let mut report = RetryReport::default();
        for id in pending {
            match self.store.delete_record(&id).await {
                Ok(()) => report.removed.push(id),
                Err(e) => {
                    tracing::warn!("Record delete for {} still failing: {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }
        self.ensure_live("retry")?;

        let mut state = self.state.lock();
        for id in &report.removed {
            state.remove(id);
        }
        if !report.removed.is_empty() {
            tracing::info!("Completed {} pending record deletes", report.removed.len());
        }
        Ok(report)
    }

    /// Put a freshly uploaded item at the head of the list
    ///
    /// Returns false if an item with the same ID is already listed.
    pub fn prepend_uploaded(&self, item: GalleryItem) -> bool {
        let mut state = self.state.lock();
        if state.position(&item.id).is_some() {
            return false;
        }
        state.items.insert(0, item);
        true
    }

    /// Tear down; responses arriving later are discarded
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        tracing::debug!("Gallery closed");
    }

    /// Check if the gallery was closed
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Subscribe to outcome notices
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> GallerySnapshot {
        let state = self.state.lock();
        GallerySnapshot {
            items: state.items.clone(),
            page_index: state.page_index,
            has_more: state.has_more,
            is_loading: state.is_loading,
            selected: state.selected.clone(),
        }
    }

    /// Loaded items in display order
    #[must_use]
    pub fn items(&self) -> Vec<GalleryItem> {
        self.state.lock().items.clone()
    }

    /// Number of loaded items
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Check if no items are loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Whether more pages may exist
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    /// Whether a fetch is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    /// Next page to fetch
    #[must_use]
    pub fn page_index(&self) -> usize {
        self.state.lock().page_index
    }

    /// Item in the detail overlay
    #[must_use]
    pub fn selected(&self) -> Option<GalleryItem> {
        self.state.lock().selected.clone()
    }

    /// Items awaiting a record delete retry
    #[must_use]
    pub fn pending_deletes(&self) -> Vec<ItemId> {
        self.state.lock().pending_record_deletes.clone()
    }

    /// Principal mutations are made for
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<(), GalleryError> {
        if self.is_closed() {
            return Err(GalleryError::Closed);
        }
        Ok(())
    }

    fn ensure_live(&self, what: &str) -> Result<(), GalleryError> {
        if self.is_closed() {
            tracing::warn!("Discarding {} response for closed gallery", what);
            return Err(GalleryError::Closed);
        }
        Ok(())
    }

    /// Look up an item and check the principal may modify it
    fn authorize(&self, id: &ItemId) -> Result<GalleryItem, GalleryError> {
        let item = {
            let state = self.state.lock();
            state
                .position(id)
                .map(|idx| state.items[idx].clone())
                .ok_or_else(|| GalleryError::UnknownItem(id.clone()))?
        };
        if !self.can_edit(&item) {
            return Err(GalleryError::Forbidden(id.clone()));
        }
        Ok(item)
    }
}

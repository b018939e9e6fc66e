//! Testing utilities for Folio workspace
//!
//! Shared fixtures and a scripted store whose page fetches can be held open.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use folio_gallery::{
    asset_public_url, GalleryConfig, GalleryItem, GalleryStore, ItemId, NewItem, PagedGallery,
    Principal, StoreError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

pub const OWNER: &str = "u1";

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Item `n`, owned by [`OWNER`]; higher `n` is older
pub fn item(n: usize) -> GalleryItem {
    let path = format!("{OWNER}/photo-{n}.jpg");
    GalleryItem::new(
        format!("img-{n}"),
        format!("Photo {n}"),
        asset_public_url(&path, &GalleryConfig::default()),
        epoch() - Duration::minutes(i64::try_from(n).unwrap()),
    )
    .with_owner(OWNER)
}

pub fn page(range: std::ops::Range<usize>) -> Vec<GalleryItem> {
    range.map(item).collect()
}

pub fn ids(items: &[GalleryItem]) -> Vec<String> {
    items.iter().map(|i| i.id.0.clone()).collect()
}

/// Gallery over `store` for [`OWNER`] with default config
pub fn gallery_for(
    store: Arc<dyn GalleryStore>,
    initial: Vec<GalleryItem>,
    total: usize,
) -> PagedGallery {
    PagedGallery::new(store, Principal::user(OWNER), GalleryConfig::default(), initial, total)
}

/// A call received by [`ScriptedStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListPage { offset: usize, limit: usize },
    Count,
    Insert { title: String },
    Update { id: ItemId, title: String },
    UploadAsset { path: String },
    DeleteAsset { path: String },
    DeleteRecord { id: ItemId },
}

#[derive(Debug, Default)]
struct Script {
    pages: VecDeque<Result<Vec<GalleryItem>, StoreError>>,
    updates: VecDeque<Result<(), StoreError>>,
    asset_deletes: VecDeque<Result<(), StoreError>>,
    record_deletes: VecDeque<Result<(), StoreError>>,
    calls: Vec<Call>,
}

/// Calls that can be held open until released
#[derive(Debug, Default, Clone, Copy)]
struct Held {
    pages: bool,
    updates: bool,
    asset_deletes: bool,
}

/// Store answering from queued responses
///
/// Unscripted page fetches return an empty page; unscripted mutations
/// succeed. Held calls (see [`hold_pages`](Self::hold_pages) and friends)
/// wait for a [`release`](Self::release) before answering.
#[derive(Debug)]
pub struct ScriptedStore {
    script: Mutex<Script>,
    held: Held,
    gate: Semaphore,
    started: Notify,
}

impl Default for ScriptedStore {
    fn default() -> Self {
        Self {
            script: Mutex::default(),
            held: Held::default(),
            gate: Semaphore::new(0),
            started: Notify::new(),
        }
    }
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page fetches block until released
    #[must_use]
    pub fn hold_pages(mut self) -> Self {
        self.held.pages = true;
        self
    }

    /// Record updates block until released
    #[must_use]
    pub fn hold_updates(mut self) -> Self {
        self.held.updates = true;
        self
    }

    /// Asset deletes block until released
    #[must_use]
    pub fn hold_asset_deletes(mut self) -> Self {
        self.held.asset_deletes = true;
        self
    }

    /// Let `n` held calls answer
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Resolves once a held call has started (one wakeup per call)
    pub async fn call_started(&self) {
        self.started.notified().await;
    }

    pub fn push_page(&self, page: Vec<GalleryItem>) -> &Self {
        self.script.lock().pages.push_back(Ok(page));
        self
    }

    pub fn push_page_error(&self, error: StoreError) -> &Self {
        self.script.lock().pages.push_back(Err(error));
        self
    }

    pub fn push_update(&self, result: Result<(), StoreError>) -> &Self {
        self.script.lock().updates.push_back(result);
        self
    }

    pub fn push_asset_delete(&self, result: Result<(), StoreError>) -> &Self {
        self.script.lock().asset_deletes.push_back(result);
        self
    }

    pub fn push_record_delete(&self, result: Result<(), StoreError>) -> &Self {
        self.script.lock().record_deletes.push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn list_page_calls(&self) -> usize {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::ListPage { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.script.lock().calls.push(call);
    }

    /// Signal the start of a call and, if held, wait for a permit
    async fn pass(&self, held: bool) -> Result<(), StoreError> {
        if !held {
            return Ok(());
        }
        self.started.notify_one();
        self.gate
            .acquire()
            .await
            .map_err(|_| StoreError::Network("gate closed".to_string()))?
            .forget();
        Ok(())
    }
}

#[async_trait::async_trait]
impl GalleryStore for ScriptedStore {
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<GalleryItem>, StoreError> {
        self.record(Call::ListPage { offset, limit });
        self.pass(self.held.pages).await?;
        self.script.lock().pages.pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.record(Call::Count);
        let script = self.script.lock();
        Ok(script.pages.iter().filter_map(|p| p.as_ref().ok()).map(Vec::len).sum())
    }

    async fn insert(&self, item: NewItem) -> Result<GalleryItem, StoreError> {
        self.record(Call::Insert {
            title: item.title.clone(),
        });
        let mut record = GalleryItem::new(ItemId::generate(), item.title, item.url, Utc::now())
            .with_owner(item.owner_id);
        record.description = item.description;
        Ok(record)
    }

    async fn update(
        &self,
        id: &ItemId,
        title: &str,
        _description: Option<String>,
    ) -> Result<(), StoreError> {
        self.record(Call::Update {
            id: id.clone(),
            title: title.to_string(),
        });
        self.pass(self.held.updates).await?;
        self.script.lock().updates.pop_front().unwrap_or(Ok(()))
    }

    async fn upload_asset(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        self.record(Call::UploadAsset {
            path: path.to_string(),
        });
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        asset_public_url(path, &GalleryConfig::default())
    }

    async fn delete_asset(&self, path: &str) -> Result<(), StoreError> {
        self.record(Call::DeleteAsset {
            path: path.to_string(),
        });
        self.pass(self.held.asset_deletes).await?;
        self.script.lock().asset_deletes.pop_front().unwrap_or(Ok(()))
    }

    async fn delete_record(&self, id: &ItemId) -> Result<(), StoreError> {
        self.record(Call::DeleteRecord { id: id.clone() });
        self.script.lock().record_deletes.pop_front().unwrap_or(Ok(()))
    }
}

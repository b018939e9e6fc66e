//! In-memory gallery store
//!
//! Keeps records newest first and asset blobs by storage path. Supports:
//! - Seeding with synthetic items
//! - Injected failures per operation
//! - Artificial latency, to exercise in-flight behavior
//! - Per-operation call counts

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use folio_gallery::{asset_public_url, GalleryConfig, GalleryItem, GalleryStore, ItemId, NewItem, StoreError, UserId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Store operations, for fault injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_page`
    ListPage,
    /// `count`
    Count,
    /// `insert`
    Insert,
    /// `update`
    Update,
    /// `upload_asset`
    UploadAsset,
    /// `delete_asset`
    DeleteAsset,
    /// `delete_record`
    DeleteRecord,
}

/// Stored asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// MIME type
    pub content_type: String,
}

#[derive(Debug, Default)]
struct Inner {
    /// Newest first
    records: Vec<GalleryItem>,
    assets: HashMap<String, Asset>,
    faults: HashMap<Operation, VecDeque<StoreError>>,
    calls: HashMap<Operation, usize>,
}

/// Gallery store held entirely in memory
#[derive(Debug)]
pub struct MemoryStore {
    config: GalleryConfig,
    latency: Option<Duration>,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new(config: GalleryConfig) -> Self {
        Self {
            config,
            latency: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create store holding `count` synthetic items owned by `owner`
    ///
    /// Item `n` is `count - n` minutes older than `now`, so `item-0` is the
    /// oldest and the highest index is listed first.
    #[must_use]
    pub fn seeded(config: GalleryConfig, count: usize, owner: Option<&str>) -> Self {
        let store = Self::new(config);
        let now = Utc::now();
        {
            let mut inner = store.inner.lock();
            for n in 0..count {
                let path = format!("{}/item-{n}.jpg", owner.unwrap_or("public"));
                let minutes = i64::try_from(count - n).unwrap_or(i64::MAX);
                let mut item = GalleryItem::new(
                    format!("item-{n}"),
                    format!("Photograph {}", n + 1),
                    asset_public_url(&path, &store.config),
                    now - ChronoDuration::minutes(minutes),
                );
                item.owner_id = owner.map(UserId::from);
                inner.assets.insert(
                    path,
                    Asset {
                        bytes: vec![0xFF, 0xD8, 0xFF],
                        content_type: "image/jpeg".to_string(),
                    },
                );
                inner.records.insert(0, item);
            }
        }
        store
    }

    /// Delay every operation by `latency`
    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call of `op` fail with `error`
    ///
    /// Queued failures are consumed in order.
    pub fn fail_next(&self, op: Operation, error: StoreError) {
        self.inner.lock().faults.entry(op).or_default().push_back(error);
    }

    /// Number of calls made to `op`
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Copy of all records, newest first
    #[must_use]
    pub fn records(&self) -> Vec<GalleryItem> {
        self.inner.lock().records.clone()
    }

    /// Stored asset at `path`
    #[must_use]
    pub fn asset(&self, path: &str) -> Option<Asset> {
        self.inner.lock().assets.get(path).cloned()
    }

    /// Number of stored assets
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.inner.lock().assets.len()
    }

    /// Count the call, apply latency, and pop an injected failure
    async fn enter(&self, op: Operation) -> Result<(), StoreError> {
        let fault = {
            let mut inner = self.inner.lock();
            *inner.calls.entry(op).or_insert(0) += 1;
            inner.faults.get_mut(&op).and_then(VecDeque::pop_front)
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match fault {
            Some(e) => {
                tracing::debug!("Injected {:?} failure: {}", op, e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn next_timestamp(records: &[GalleryItem]) -> DateTime<Utc> {
        let now = Utc::now();
        match records.first() {
            // Keep newest-first order even when the clock does not advance
            Some(newest) if newest.created_at >= now => {
                newest.created_at + ChronoDuration::milliseconds(1)
            }
            _ => now,
        }
    }
}

#[async_trait::async_trait]
impl GalleryStore for MemoryStore {
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<GalleryItem>, StoreError> {
        self.enter(Operation::ListPage).await?;
        let inner = self.inner.lock();
        Ok(inner.records.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.enter(Operation::Count).await?;
        Ok(self.inner.lock().records.len())
    }

    async fn insert(&self, item: NewItem) -> Result<GalleryItem, StoreError> {
        self.enter(Operation::Insert).await?;
        if item.title.trim().is_empty() {
            return Err(StoreError::Validation("title must not be empty".to_string()));
        }

        let mut inner = self.inner.lock();
        let record = GalleryItem {
            id: ItemId::generate(),
            title: item.title,
            description: item.description,
            url: item.url,
            created_at: Self::next_timestamp(&inner.records),
            owner_id: Some(item.owner_id),
        };
        inner.records.insert(0, record.clone());
        tracing::debug!("Inserted record {}", record.id);
        Ok(record)
    }

    async fn update(
        &self,
        id: &ItemId,
        title: &str,
        description: Option<String>,
    ) -> Result<(), StoreError> {
        self.enter(Operation::Update).await?;
        if title.trim().is_empty() {
            return Err(StoreError::Validation("title must not be empty".to_string()));
        }

        let mut inner = self.inner.lock();
        let record = inner
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("record {id}")))?;
        record.title = title.to_string();
        record.description = description;
        Ok(())
    }

    async fn upload_asset(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.enter(Operation::UploadAsset).await?;
        let mut inner = self.inner.lock();
        if inner.assets.contains_key(path) {
            return Err(StoreError::Validation(format!("asset {path} already exists")));
        }
        inner.assets.insert(
            path.to_string(),
            Asset {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        asset_public_url(path, &self.config)
    }

    async fn delete_asset(&self, path: &str) -> Result<(), StoreError> {
        self.enter(Operation::DeleteAsset).await?;
        self.inner
            .lock()
            .assets
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("asset {path}")))
    }

    async fn delete_record(&self, id: &ItemId) -> Result<(), StoreError> {
        self.enter(Operation::DeleteRecord).await?;
        let mut inner = self.inner.lock();
        let before = inner.records.len();
        inner.records.retain(|r| &r.id != id);
        if inner.records.len() == before {
            return Err(StoreError::NotFound(format!("record {id}")));
        }
        Ok(())
    }
}

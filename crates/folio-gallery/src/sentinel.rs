//! Sentinel-driven incremental loading
//!
//! A host (browser, terminal UI, test) reports how much of the end-of-list
//! sentinel is visible. Crossing the configured threshold requests the next
//! page; the gallery's single in-flight guard makes repeated signals harmless.

use crate::gallery::{LoadOutcome, PagedGallery};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Tracks sentinel visibility against a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentinel {
    threshold: f64,
    visible: bool,
}

impl Sentinel {
    /// Create sentinel with a visibility threshold in (0, 1]
    #[inline]
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            visible: false,
        }
    }

    /// Record a visibility ratio; returns true when the sentinel just became visible
    pub fn observe(&mut self, ratio: f64) -> bool {
        let now_visible = ratio >= self.threshold;
        let crossed = now_visible && !self.visible;
        self.visible = now_visible;
        crossed
    }

    /// Whether the sentinel is currently past the threshold
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Consume visibility signals and load pages while the sentinel stays visible
///
/// Runs until the sender side is dropped or the gallery is closed. After a
/// successful load with the sentinel still visible, the next page is
/// requested straight away, as a freshly rendered list would re-signal.
/// Returns the number of pages appended.
pub async fn drive_sentinel(gallery: Arc<PagedGallery>, mut signals: mpsc::Receiver<f64>) -> usize {
    let mut sentinel = Sentinel::new(gallery.config().sentinel_threshold);
    let mut pages = 0;

    while let Some(ratio) = signals.recv().await {
        if gallery.is_closed() {
            break;
        }
        sentinel.observe(ratio);

        while sentinel.is_visible() && gallery.has_more() {
            match gallery.load_next_page().await {
                Ok(LoadOutcome::Appended { .. }) => pages += 1,
                Ok(_) => break,
                Err(e) => {
                    // Retry waits for the next signal
                    tracing::debug!("Sentinel load failed: {}", e);
                    break;
                }
            }
            // Pick up any signals that arrived during the fetch
            while let Ok(ratio) = signals.try_recv() {
                sentinel.observe(ratio);
            }
        }
    }

    tracing::debug!("Sentinel driver stopped after {} pages", pages);
    pages
}

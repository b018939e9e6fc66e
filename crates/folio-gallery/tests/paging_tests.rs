//! Incremental loading: ordering, exhaustion, the in-flight guard and teardown.

use folio_gallery::{GalleryError, ItemId, LoadOutcome, SkipReason, StoreError};
use folio_test_utils::{gallery_for, ids, item, page, Call, ScriptedStore};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[tokio::test]
async fn three_loads_from_empty_list_with_total_25() {
    let store = Arc::new(ScriptedStore::new());
    store.push_page(page(0..12)).push_page(page(12..24)).push_page(page(24..25));
    let gallery = gallery_for(store.clone(), Vec::new(), 25);

    gallery.load_next_page().await.unwrap();
    assert_eq!((gallery.len(), gallery.has_more()), (12, true));

    gallery.load_next_page().await.unwrap();
    assert_eq!((gallery.len(), gallery.has_more()), (24, true));

    gallery.load_next_page().await.unwrap();
    assert_eq!((gallery.len(), gallery.has_more()), (25, false));

    assert_eq!(
        store.calls(),
        vec![
            Call::ListPage { offset: 12, limit: 12 },
            Call::ListPage { offset: 24, limit: 12 },
            Call::ListPage { offset: 36, limit: 12 },
        ]
    );
}

#[tokio::test]
async fn second_load_while_in_flight_does_not_fetch() {
    let store = Arc::new(ScriptedStore::new().hold_pages());
    store.push_page(page(12..24));
    let gallery = Arc::new(gallery_for(store.clone(), page(0..12), 100));

    let first = tokio::spawn({
        let gallery = gallery.clone();
        async move { gallery.load_next_page().await }
    });
    store.call_started().await;
    assert!(gallery.is_loading());

    let second = gallery.load_next_page().await.unwrap();
    assert_eq!(second, LoadOutcome::Skipped(SkipReason::Loading));
    assert_eq!(store.list_page_calls(), 1);

    store.release(1);
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome, LoadOutcome::Appended { added: 12, has_more: true });
    assert!(!gallery.is_loading());
    assert_eq!(store.list_page_calls(), 1);
}

#[tokio::test]
async fn failed_fetch_is_retried_by_next_signal() {
    let store = Arc::new(ScriptedStore::new());
    store
        .push_page_error(StoreError::Network("offline".into()))
        .push_page(page(12..24));
    let gallery = gallery_for(store.clone(), page(0..12), 30);
    let before = gallery.snapshot();

    assert!(matches!(
        gallery.load_next_page().await,
        Err(GalleryError::Store(StoreError::Network(_)))
    ));
    assert_eq!(gallery.snapshot(), before);

    gallery.load_next_page().await.unwrap();
    assert_eq!(ids(&gallery.items()), ids(&page(0..24)));
    assert_eq!(
        store.calls(),
        vec![
            Call::ListPage { offset: 12, limit: 12 },
            Call::ListPage { offset: 12, limit: 12 },
        ]
    );
}

#[tokio::test]
async fn response_after_close_is_discarded() {
    let store = Arc::new(ScriptedStore::new().hold_pages());
    store.push_page(page(12..24));
    let gallery = Arc::new(gallery_for(store.clone(), page(0..12), 100));

    let pending = tokio::spawn({
        let gallery = gallery.clone();
        async move { gallery.load_next_page().await }
    });
    store.call_started().await;
    gallery.close();
    store.release(1);

    assert!(matches!(pending.await.unwrap(), Err(GalleryError::Closed)));
    assert_eq!(gallery.len(), 12);
    assert_eq!(gallery.page_index(), 1);
}

#[tokio::test]
async fn delete_during_load_is_applied_by_id() {
    let store = Arc::new(ScriptedStore::new().hold_pages());
    store.push_page(page(12..24));
    let gallery = Arc::new(gallery_for(store.clone(), page(0..12), 100));

    let load = tokio::spawn({
        let gallery = gallery.clone();
        async move { gallery.load_next_page().await }
    });
    store.call_started().await;

    gallery.apply_delete(&ItemId::from("img-3")).await.unwrap();
    assert_eq!(gallery.len(), 11);

    store.release(1);
    load.await.unwrap().unwrap();

    let loaded = gallery.items();
    assert_eq!(loaded.len(), 23);
    assert!(loaded.iter().all(|i| i.id.as_str() != "img-3"));
    assert_eq!(loaded[3], item(4));
}

#[tokio::test]
async fn page_overlapping_an_upload_does_not_duplicate() {
    let store = Arc::new(ScriptedStore::new());
    // The backend shifted by one after an upload, so the next page repeats img-11
    store.push_page(page(11..23));
    let gallery = gallery_for(store.clone(), page(0..12), 100);

    let outcome = gallery.load_next_page().await.unwrap();
    assert_eq!(outcome, LoadOutcome::Appended { added: 11, has_more: true });
    assert_eq!(ids(&gallery.items()), ids(&page(0..23)));
}

proptest! {
    #[test]
    fn prop_loads_concatenate_pages_until_short_page(
        sizes in proptest::collection::vec(0usize..=12, 1..8)
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = Arc::new(ScriptedStore::new());
            let mut next = 0;
            let mut expected = Vec::new();
            let mut exhausted_after = None;
            for (i, size) in sizes.iter().copied().enumerate() {
                let p = page(next..next + size);
                next += size;
                store.push_page(p.clone());
                if exhausted_after.is_none() {
                    expected.extend(p);
                    if size < 12 {
                        exhausted_after = Some(i + 1);
                    }
                }
            }

            let gallery = gallery_for(store.clone(), Vec::new(), usize::MAX);
            let mut was_exhausted = false;
            for _ in 0..sizes.len() + 2 {
                gallery.load_next_page().await.unwrap();
                if was_exhausted {
                    prop_assert!(!gallery.has_more());
                }
                was_exhausted = !gallery.has_more();
            }

            prop_assert_eq!(ids(&gallery.items()), ids(&expected));
            let fetches = exhausted_after.unwrap_or(sizes.len() + 1);
            prop_assert_eq!(store.list_page_calls(), fetches);
            prop_assert!(!gallery.has_more());

            let mut seen = std::collections::HashSet::new();
            prop_assert!(gallery.items().iter().all(|i| seen.insert(i.id.clone())));
            Ok(())
        })?;
    }
}

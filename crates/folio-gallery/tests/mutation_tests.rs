//! Edit, delete and upload against a scripted backend.

use folio_gallery::{
    drive_sentinel, GalleryError, ItemId, Principal, Severity, StoreError, UploadRequest, Uploader,
};
use folio_test_utils::{gallery_for, ids, item, page, Call, ScriptedStore};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::test]
async fn edit_keeps_identity_and_position() {
    let store = Arc::new(ScriptedStore::new());
    let gallery = gallery_for(store.clone(), page(0..5), 5);
    let mut notices = gallery.subscribe();

    gallery
        .apply_edit(&ItemId::from("img-2"), "Harbor at dusk", "Long exposure")
        .await
        .unwrap();

    let items = gallery.items();
    assert_eq!(ids(&items), ids(&page(0..5)));
    assert_eq!(items[2].title, "Harbor at dusk");
    assert_eq!(items[2].description.as_deref(), Some("Long exposure"));
    assert_eq!(items[2].url, item(2).url);
    assert_eq!(items[2].created_at, item(2).created_at);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.severity, Severity::Success);
    assert_eq!(notice.title, "Image updated");
    assert_eq!(
        store.calls(),
        vec![Call::Update {
            id: ItemId::from("img-2"),
            title: "Harbor at dusk".to_string(),
        }]
    );
}

#[tokio::test]
async fn rejected_edit_reports_and_changes_nothing() {
    let store = Arc::new(ScriptedStore::new());
    store.push_update(Err(StoreError::Validation("title too long".into())));
    let gallery = gallery_for(store.clone(), page(0..3), 3);
    let mut notices = gallery.subscribe();
    let before = gallery.snapshot();

    let err = gallery
        .apply_edit(&ItemId::from("img-0"), "x", "")
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    assert_eq!(gallery.snapshot(), before);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.description, "Failed to update the image: title too long.");
}

#[tokio::test]
async fn delete_removes_asset_before_record() {
    let store = Arc::new(ScriptedStore::new());
    let gallery = gallery_for(store.clone(), page(0..4), 4);
    gallery.select_by_id(&ItemId::from("img-1")).unwrap();

    gallery.apply_delete(&ItemId::from("img-1")).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            Call::DeleteAsset {
                path: "u1/photo-1.jpg".to_string()
            },
            Call::DeleteRecord {
                id: ItemId::from("img-1")
            },
        ]
    );
    assert_eq!(ids(&gallery.items()), vec!["img-0", "img-2", "img-3"]);
    assert_eq!(gallery.selected(), None);
}

#[tokio::test]
async fn failed_asset_delete_keeps_record_and_item() {
    let store = Arc::new(ScriptedStore::new());
    store.push_asset_delete(Err(StoreError::Network("connection reset".into())));
    let gallery = gallery_for(store.clone(), page(0..3), 3);
    let before = gallery.snapshot();

    let err = gallery.apply_delete(&ItemId::from("img-0")).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(gallery.snapshot(), before);
    assert!(!store
        .calls()
        .iter()
        .any(|c| matches!(c, Call::DeleteRecord { .. })));
}

#[tokio::test]
async fn orphaned_record_is_cleaned_up_on_retry() {
    let store = Arc::new(ScriptedStore::new());
    store
        .push_record_delete(Err(StoreError::Network("timeout".into())))
        .push_record_delete(Err(StoreError::Network("timeout".into())))
        .push_record_delete(Ok(()));
    let gallery = gallery_for(store.clone(), page(0..3), 3);

    let err = gallery.apply_delete(&ItemId::from("img-2")).await.unwrap_err();
    assert!(matches!(
        err,
        GalleryError::RecordDeleteFailed { ref id, .. } if id.as_str() == "img-2"
    ));
    assert_eq!(gallery.len(), 3);

    let report = gallery.retry_pending_deletes().await.unwrap();
    assert!(report.removed.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(gallery.pending_deletes(), vec![ItemId::from("img-2")]);

    let report = gallery.retry_pending_deletes().await.unwrap();
    assert_eq!(report.removed, vec![ItemId::from("img-2")]);
    assert_eq!(ids(&gallery.items()), vec!["img-0", "img-1"]);
    assert!(gallery.pending_deletes().is_empty());

    // The asset was only ever deleted once
    let asset_deletes = store
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::DeleteAsset { .. }))
        .count();
    assert_eq!(asset_deletes, 1);
}

#[tokio::test]
async fn foreign_items_are_not_touched() {
    let store = Arc::new(ScriptedStore::new());
    let foreign = item(7).with_owner("someone-else");
    let gallery = gallery_for(store.clone(), vec![item(0), foreign.clone()], 2);
    let mut notices = gallery.subscribe();

    assert!(gallery.can_edit(&item(0)));
    assert!(!gallery.can_edit(&foreign));
    assert!(matches!(
        gallery.apply_delete(&foreign.id).await,
        Err(GalleryError::Forbidden(_))
    ));
    assert!(store.calls().is_empty());
    assert_eq!(
        notices.try_recv().unwrap().description,
        "You are not allowed to delete the image."
    );
}

#[tokio::test]
async fn uploaded_item_is_prepended() {
    let store = Arc::new(ScriptedStore::new());
    let gallery = gallery_for(store.clone(), page(0..2), 2);
    let uploader = Uploader::new(store.clone());

    let fresh = uploader
        .upload(
            gallery.principal(),
            UploadRequest::new("Pier", "pier.jpeg", "image/jpeg", vec![0xFF, 0xD8])
                .with_description("Morning fog"),
        )
        .await
        .unwrap();
    assert!(gallery.prepend_uploaded(fresh.clone()));

    let items = gallery.items();
    assert_eq!(items[0], fresh);
    assert_eq!(items.len(), 3);
    assert_eq!(fresh.description.as_deref(), Some("Morning fog"));

    // The new item can be deleted through the gallery like any other
    gallery.apply_delete(&fresh.id).await.unwrap();
    assert_eq!(gallery.len(), 2);
    let calls = store.calls();
    let Call::UploadAsset { path } = &calls[0] else {
        panic!("expected upload first, got {calls:?}");
    };
    assert!(calls.contains(&Call::DeleteAsset { path: path.clone() }));
}

#[tokio::test]
async fn anonymous_upload_is_refused() {
    let store = Arc::new(ScriptedStore::new());
    let uploader = Uploader::new(store.clone());

    let result = uploader
        .upload(
            &Principal::Anonymous,
            UploadRequest::new("Pier", "pier.jpg", "image/jpeg", vec![1]),
        )
        .await;
    assert!(result.is_err());
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn sentinel_keeps_loading_while_visible() {
    let store = Arc::new(ScriptedStore::new());
    store
        .push_page(page(12..24))
        .push_page(page(24..36))
        .push_page(page(36..40));
    let gallery = Arc::new(gallery_for(store.clone(), page(0..12), 1000));

    let (tx, rx) = mpsc::channel(8);
    let driver = tokio::spawn(drive_sentinel(gallery.clone(), rx));

    // Below the threshold: nothing happens
    tx.send(0.05).await.unwrap();
    // Visible: load until the short page
    tx.send(0.5).await.unwrap();
    drop(tx);

    let pages = driver.await.unwrap();
    assert_eq!(pages, 3);
    assert_eq!(gallery.len(), 40);
    assert!(!gallery.has_more());
    assert_eq!(store.list_page_calls(), 3);
}

#[tokio::test]
async fn sentinel_stops_on_failure_until_next_signal() {
    let store = Arc::new(ScriptedStore::new());
    store
        .push_page_error(StoreError::Network("offline".into()))
        .push_page(page(12..15));
    let gallery = Arc::new(gallery_for(store.clone(), page(0..12), 1000));

    let (tx, rx) = mpsc::channel(8);
    let driver = tokio::spawn(drive_sentinel(gallery.clone(), rx));

    tx.send(1.0).await.unwrap();
    drop(tx);
    let pages = driver.await.unwrap();

    // Only one signal arrived, so the failed fetch is not retried
    assert_eq!(pages, 0);
    assert_eq!(gallery.len(), 12);
    assert_eq!(store.list_page_calls(), 1);
}

#[tokio::test]
async fn clicking_delete_again_finishes_a_partial_delete() {
    let store = Arc::new(ScriptedStore::new());
    store.push_record_delete(Err(StoreError::Network("timeout".into())));
    let gallery = gallery_for(store.clone(), page(0..3), 3);
    let id = ItemId::from("img-2");

    assert!(matches!(
        gallery.apply_delete(&id).await,
        Err(GalleryError::RecordDeleteFailed { .. })
    ));
    gallery.apply_delete(&id).await.unwrap();

    assert_eq!(ids(&gallery.items()), vec!["img-0", "img-1"]);
    assert!(gallery.pending_deletes().is_empty());
    assert_eq!(
        store.calls(),
        vec![
            Call::DeleteAsset {
                path: "u1/photo-2.jpg".to_string()
            },
            Call::DeleteRecord { id: id.clone() },
            Call::DeleteRecord { id },
        ]
    );
}

#[tokio::test]
async fn edit_response_after_close_is_discarded() {
    let store = Arc::new(ScriptedStore::new().hold_updates());
    let gallery = Arc::new(gallery_for(store.clone(), page(0..3), 3));
    gallery.select_by_id(&ItemId::from("img-1")).unwrap();
    let before = gallery.snapshot();

    let edit = tokio::spawn({
        let gallery = gallery.clone();
        async move {
            gallery
                .apply_edit(&ItemId::from("img-1"), "Renamed", "caption")
                .await
        }
    });
    store.call_started().await;
    gallery.close();
    store.release(1);

    assert!(matches!(edit.await.unwrap(), Err(GalleryError::Closed)));
    assert_eq!(gallery.snapshot(), before);
}

#[tokio::test]
async fn delete_after_close_still_removes_the_record() {
    let store = Arc::new(ScriptedStore::new().hold_asset_deletes());
    let gallery = Arc::new(gallery_for(store.clone(), page(0..3), 3));
    let before = gallery.snapshot();

    let delete = tokio::spawn({
        let gallery = gallery.clone();
        async move { gallery.apply_delete(&ItemId::from("img-0")).await }
    });
    store.call_started().await;
    gallery.close();
    store.release(1);

    assert!(matches!(delete.await.unwrap(), Err(GalleryError::Closed)));
    assert_eq!(gallery.snapshot(), before);
    // The asset is gone, so the record must not be left behind
    assert_eq!(
        store.calls().last(),
        Some(&Call::DeleteRecord {
            id: ItemId::from("img-0")
        })
    );
}

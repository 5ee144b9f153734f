use std::sync::Arc;

use tabmark::controller::{LoadOutcome, LoadPhase, RemovalOutcome};
use tabmark::error::{ApiError, StoreError};
use tabmark::store::{BookmarkStore, ChromiumStore, StoreEvent};
use tabmark::tree::transform::find_by_id;
use tabmark::tree::FolderType;
use tempfile::TempDir;

use crate::integration::support::{controller_for, temp_bookmarks};

#[tokio::test]
async fn chromium_tree_loads_under_untitled_root() {
    let (_dir, path) = temp_bookmarks();
    let controller = controller_for(Arc::new(ChromiumStore::open(&path)));

    assert_eq!(controller.load().await, LoadOutcome::Applied);
    let state = controller.snapshot();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert_eq!(state.tree.len(), 1);
    assert_eq!(state.tree[0].id, "0");

    let bar = controller.find_node("1").unwrap();
    assert_eq!(bar.folder_type, Some(FolderType::BookmarksBar));
    // folders before bookmarks, whatever the file order
    let order: Vec<&str> = bar.child_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(order, vec!["6", "5"]);
    assert_eq!(
        controller.find_node("5").unwrap().date_added,
        Some(1_704_067_200_000 + 2 * 86_400_000)
    );
    // "2024" sits at depth 3 under the root
    assert!(controller.is_collapsed("7"));
    assert!(controller.is_collapsed("6"));
    assert!(!controller.is_collapsed("1"));
}

#[tokio::test]
async fn missing_file_is_store_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = ChromiumStore::open(dir.path().join("Bookmarks"));
    let err = store.fetch_tree().await.unwrap_err();
    assert!(err.is_unavailable());

    let controller = controller_for(Arc::new(ChromiumStore::open(dir.path().join("Bookmarks"))));
    assert_eq!(controller.load().await, LoadOutcome::Failed);
    assert!(controller.snapshot().error.unwrap().contains("No bookmarks file"));
}

#[tokio::test]
async fn removal_rewrites_file_and_reloads() {
    let (_dir, path) = temp_bookmarks();
    let store = Arc::new(ChromiumStore::open(&path));
    let mut events = store.subscribe();
    let controller = controller_for(store.clone());
    controller.load().await;

    assert_eq!(controller.remove_by_id("5").await.unwrap(), RemovalOutcome::Removed);
    assert!(controller.find_node("5").is_none());
    assert_eq!(events.recv().await.unwrap(), StoreEvent::Removed { id: "5".to_string() });

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(written.get("checksum").is_none());
    let on_disk = store.fetch_tree().await.unwrap();
    assert!(find_by_id(&on_disk, "5").is_none());
    assert!(find_by_id(&on_disk, "8").is_some());
}

#[tokio::test]
async fn root_folders_cannot_be_removed() {
    let (_dir, path) = temp_bookmarks();
    let store = ChromiumStore::open(&path);
    let err = store.remove("2").await.unwrap_err();
    assert!(matches!(err, StoreError::Provider(_)));

    let controller = controller_for(Arc::new(ChromiumStore::open(&path)));
    controller.load().await;
    let err = controller.remove_by_id("1").await.unwrap_err();
    assert!(matches!(err, ApiError::NotRemovable { .. }));
}

#[tokio::test]
async fn created_nodes_get_fresh_ids() {
    let (_dir, path) = temp_bookmarks();
    let store = ChromiumStore::open(&path);
    let folder = store.create_folder("Reading", None).await.unwrap();
    assert_eq!(folder.id, "9");
    assert_eq!(folder.parent_id.as_deref(), Some("1"));

    let bookmark = store
        .create_bookmark("Tokio", "https://tokio.rs/", Some(&folder.id))
        .await
        .unwrap();
    assert_eq!(bookmark.id, "10");

    let tree = store.fetch_tree().await.unwrap();
    let reading = find_by_id(&tree, "9").unwrap();
    assert_eq!(reading.child_nodes()[0].url.as_deref(), Some("https://tokio.rs/"));
    assert!(reading.child_nodes()[0].date_added.is_some());
}

use std::sync::Arc;
use std::time::Duration;

use tabmark::controller::{LoadPhase, NoticeKind};
use tabmark::error::{ApiError, StoreError};
use tabmark::store::{BookmarkStore, MemoryStore, StoreEvent};
use tabmark::tree::transform::{filter_tree, prepare};
use tabmark::tree::{BookmarkNode, CollapseState, FolderType};
use tokio::time::sleep;

use crate::integration::support::controller_for;

#[test]
fn bookmarks_bar_is_tagged_after_prepare() {
    let tree = prepare(&[BookmarkNode::folder(
        "1",
        "Bookmarks bar",
        vec![BookmarkNode::bookmark("2", "News", "http://news.example")],
    )]);
    assert_eq!(tree[0].folder_type, Some(FolderType::BookmarksBar));
    assert_eq!(tree[0].child_nodes()[0].folder_type, None);
}

#[test]
fn auto_collapse_starts_at_depth_two() {
    let tree = vec![BookmarkNode::folder(
        "10",
        "Work",
        vec![BookmarkNode::folder(
            "11",
            "Projects",
            vec![BookmarkNode::folder(
                "12",
                "2024",
                vec![BookmarkNode::bookmark("13", "Plan", "http://plan.example")],
            )],
        )],
    )];
    let mut collapse = CollapseState::new();
    collapse.auto_collapse(&tree, 2);
    assert!(collapse.is_collapsed("12"));
    assert!(!collapse.is_collapsed("10"));
    assert!(!collapse.is_collapsed("11"));
    assert!(!collapse.is_collapsed("13"));
}

#[test]
fn filter_keeps_folder_with_matching_descendant() {
    let tree = vec![BookmarkNode::folder(
        "1",
        "Work",
        vec![
            BookmarkNode::bookmark("2", "Resume", "http://x"),
            BookmarkNode::bookmark("3", "Notes", "http://y"),
        ],
    )];
    let filtered = filter_tree(&tree, "resume");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, "1");
    let kept: Vec<&str> = filtered[0].child_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(kept, vec!["2"]);
    assert_eq!(filter_tree(&tree, "   "), tree);
}

#[tokio::test]
async fn other_bookmarks_rejected_before_store_call() {
    let store = Arc::new(MemoryStore::demo());
    let controller = controller_for(store.clone());
    controller.start().await;
    let mut notices = controller.subscribe_notices();

    let err = controller.remove_by_id("2").await.unwrap_err();
    assert!(matches!(err, ApiError::NotRemovable { ref id, .. } if id == "2"));
    assert_eq!(store.remove_count(), 0);
    assert_eq!(notices.recv().await.unwrap().kind, NoticeKind::NotRemovable);
}

#[tokio::test(start_paused = true)]
async fn rapid_created_events_end_loaded() {
    let store = Arc::new(MemoryStore::demo().with_latency(Duration::from_millis(40)));
    let controller = controller_for(store.clone());
    controller.start().await;

    let created = store.create_bookmark("Fresh", "https://fresh.example", None).await.unwrap();
    for _ in 0..2 {
        sleep(Duration::from_millis(15)).await;
        store.emit(StoreEvent::Created { id: created.id.clone() });
    }
    sleep(Duration::from_millis(500)).await;

    let state = controller.snapshot();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert!(!state.loading);
    assert!(controller.find_node(&created.id).is_some());
}

#[tokio::test]
async fn failed_reload_keeps_last_good_tree() {
    let store = Arc::new(MemoryStore::demo());
    let controller = controller_for(store.clone());
    controller.start().await;
    let good = controller.snapshot().tree;

    store.fail_next_fetch(StoreError::Provider("disk busy".to_string()));
    controller.load().await;
    let state = controller.snapshot();
    assert_eq!(state.phase, LoadPhase::Failed);
    assert_eq!(state.tree, good);
    assert!(state.error.unwrap().contains("disk busy"));
}

#[tokio::test(start_paused = true)]
async fn dropped_controller_releases_subscription() {
    let store = Arc::new(MemoryStore::demo());
    let controller = controller_for(store.clone());
    controller.start().await;
    let weak = Arc::downgrade(&controller);
    drop(controller);
    sleep(Duration::from_millis(10)).await;
    assert!(weak.upgrade().is_none());

    let fetches = store.fetch_count();
    store.emit(StoreEvent::Changed { id: None });
    sleep(Duration::from_millis(50)).await;
    assert_eq!(store.fetch_count(), fetches);
}

use std::sync::Arc;

use tabmark::config::{StoreBackend, TabmarkConfig};
use tabmark::controller::{AssumeYes, SystemOpener};
use tabmark::store::ChromiumStore;
use tabmark::tooling::cli::{build_store, CliContext, Commands};

use crate::integration::support::temp_bookmarks;

fn chromium_context(path: &std::path::Path) -> CliContext {
    CliContext::with_store(
        TabmarkConfig::default(),
        Arc::new(ChromiumStore::open(path)),
        Arc::new(AssumeYes),
        Arc::new(SystemOpener),
    )
}

#[tokio::test]
async fn tree_json_contract_has_required_fields() {
    let (_dir, path) = temp_bookmarks();
    let cli = chromium_context(&path);
    let output = cli
        .execute(&Commands::Tree {
            query: None,
            expand_all: true,
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["phase"], "loaded");
    assert!(parsed["error"].is_null());
    let rows = parsed["rows"].as_array().unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["0", "1", "6", "7", "8", "5", "2", "3"]);
    for row in rows {
        assert!(row.get("depth").and_then(|v| v.as_u64()).is_some());
        assert!(row.get("is_folder").and_then(|v| v.as_bool()).is_some());
        assert!(row.get("collapsed").and_then(|v| v.as_bool()).is_some());
        assert!(row.get("removable").and_then(|v| v.as_bool()).is_some());
        assert!(row.get("date_label").and_then(|v| v.as_str()).is_some());
    }
}

#[tokio::test]
async fn collapsed_tree_hides_deep_folders() {
    let (_dir, path) = temp_bookmarks();
    let cli = chromium_context(&path);
    let output = cli
        .execute(&Commands::Tree {
            query: None,
            expand_all: false,
            format: "json".to_string(),
        })
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let ids: Vec<&str> = parsed["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["0", "1", "6", "5", "2", "3"]);
}

#[tokio::test]
async fn search_json_keeps_only_matching_branch() {
    let (_dir, path) = temp_bookmarks();
    let cli = chromium_context(&path);
    let output = cli
        .execute(&Commands::Search {
            query: "PLAN".to_string(),
            format: "json".to_string(),
        })
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["query"], "PLAN");
    let ids: Vec<&str> = parsed["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["0", "1", "6", "7", "8"]);
}

#[tokio::test]
async fn add_then_remove_round_trips_through_file() {
    let (_dir, path) = temp_bookmarks();
    let cli = chromium_context(&path);
    let created = cli
        .execute(&Commands::AddBookmark {
            title: "Crates".to_string(),
            url: "https://crates.io/".to_string(),
            parent: Some("2".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(created, "Created bookmark \"Crates\" [9]");

    let removed = cli
        .execute(&Commands::Remove {
            id: "9".to_string(),
            yes: true,
        })
        .await
        .unwrap();
    assert_eq!(removed, "Removed bookmark \"Crates\"");
}

#[tokio::test]
async fn config_command_renders_toml() {
    let (_dir, path) = temp_bookmarks();
    let output = chromium_context(&path).execute(&Commands::Config).await.unwrap();
    assert!(output.contains("[view]"));
    assert!(output.contains("search_debounce_ms = 300"));
}

#[test]
fn memory_backend_builds_without_files() {
    let mut config = TabmarkConfig::default();
    config.store.backend = StoreBackend::Memory;
    assert!(build_store(&config.store).is_ok());
}

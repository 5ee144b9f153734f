use std::path::{Path, PathBuf};
use std::sync::Arc;

use tabmark::controller::{AssumeYes, BookmarkTreeController, ControllerContext, ControllerSettings, SystemOpener};
use tabmark::store::BookmarkStore;
use tempfile::TempDir;

/// 2024-01-01 in WebKit microseconds
const BASE_WEBKIT: i64 = 13_348_540_800_000_000;
const DAY_MICROS: i64 = 86_400_000_000;

fn stamp(days: i64) -> String {
    (BASE_WEBKIT + days * DAY_MICROS).to_string()
}

/// Chromium `Bookmarks` document with a small nested tree
pub fn chromium_document() -> serde_json::Value {
    serde_json::json!({
        "checksum": "0123456789abcdef",
        "roots": {
            "bookmark_bar": {
                "children": [
                    {
                        "date_added": stamp(2),
                        "id": "5",
                        "name": "Docs",
                        "type": "url",
                        "url": "https://docs.rs/"
                    },
                    {
                        "children": [
                            {
                                "children": [
                                    {
                                        "date_added": stamp(3),
                                        "id": "8",
                                        "name": "Plan",
                                        "type": "url",
                                        "url": "https://plan.example/"
                                    }
                                ],
                                "date_added": stamp(1),
                                "date_modified": "0",
                                "id": "7",
                                "name": "2024",
                                "type": "folder"
                            }
                        ],
                        "date_added": stamp(1),
                        "date_modified": "0",
                        "id": "6",
                        "name": "Projects",
                        "type": "folder"
                    }
                ],
                "date_added": stamp(0),
                "date_modified": "0",
                "id": "1",
                "name": "Bookmarks bar",
                "type": "folder"
            },
            "other": {
                "children": [],
                "date_added": stamp(0),
                "date_modified": "0",
                "id": "2",
                "name": "Other bookmarks",
                "type": "folder"
            },
            "synced": {
                "children": [],
                "date_added": stamp(0),
                "date_modified": "0",
                "id": "3",
                "name": "Mobile bookmarks",
                "type": "folder"
            }
        },
        "version": 1
    })
}

pub fn write_bookmarks_file(dir: &Path) -> PathBuf {
    let path = dir.join("Bookmarks");
    std::fs::write(&path, serde_json::to_string_pretty(&chromium_document()).unwrap()).unwrap();
    path
}

pub fn temp_bookmarks() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = write_bookmarks_file(dir.path());
    (dir, path)
}

pub fn controller_for(store: Arc<dyn BookmarkStore>) -> Arc<BookmarkTreeController> {
    let context = ControllerContext::new(Arc::new(AssumeYes), Arc::new(SystemOpener));
    Arc::new(BookmarkTreeController::new(store, context, ControllerSettings::default()))
}

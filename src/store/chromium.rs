//! Chromium profile bookmark store
//!
//! Reads and edits the `Bookmarks` JSON file of a Chromium-family browser
//! profile. The file keeps three root folders under `roots` and stores
//! timestamps as microseconds since 1601-01-01, encoded as strings.

use super::{assign_positions, BookmarkStore, StoreEvent, EVENT_CHANNEL_CAPACITY};
use crate::error::StoreError;
use crate::tree::BookmarkNode;
use crate::types::{Timestamp, BOOKMARKS_BAR_ID, ROOT_ID};
use async_trait::async_trait;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Milliseconds between 1601-01-01 and 1970-01-01
const WEBKIT_EPOCH_OFFSET_MS: i64 = 11_644_473_600_000;

#[derive(Debug, Deserialize)]
struct RawFile {
    roots: RawRoots,
}

#[derive(Debug, Deserialize)]
struct RawRoots {
    bookmark_bar: RawNode,
    other: RawNode,
    #[serde(default)]
    synced: Option<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Url,
    Folder,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: RawKind,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    children: Vec<RawNode>,
    #[serde(default)]
    date_added: Option<String>,
    #[serde(default)]
    date_modified: Option<String>,
}

impl RawNode {
    fn into_node(self) -> BookmarkNode {
        let date_added = self.date_added.as_deref().and_then(webkit_to_epoch_ms);
        let mut node = match self.kind {
            RawKind::Url => BookmarkNode::bookmark(self.id, self.name, self.url.unwrap_or_default()),
            RawKind::Folder => {
                let children = self.children.into_iter().map(RawNode::into_node).collect();
                let mut folder = BookmarkNode::folder(self.id, self.name, children);
                folder.date_group_modified = self.date_modified.as_deref().and_then(webkit_to_epoch_ms);
                folder
            }
        };
        node.date_added = date_added;
        node
    }
}

/// Convert a WebKit timestamp string to epoch milliseconds; zero means unset
pub fn webkit_to_epoch_ms(raw: &str) -> Option<Timestamp> {
    let micros: i64 = raw.trim().parse().ok()?;
    if micros <= 0 {
        return None;
    }
    Some(micros / 1000 - WEBKIT_EPOCH_OFFSET_MS)
}

pub fn epoch_ms_to_webkit(ms: Timestamp) -> String {
    ((ms + WEBKIT_EPOCH_OFFSET_MS) * 1000).to_string()
}

/// Bookmark store backed by a Chromium `Bookmarks` file
pub struct ChromiumStore {
    path: PathBuf,
    events: broadcast::Sender<StoreEvent>,
    write_lock: tokio::sync::Mutex<()>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl ChromiumStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            path: path.into(),
            events,
            write_lock: tokio::sync::Mutex::new(()),
            watcher: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Watch the file for edits made by the browser
    pub fn watch(&self) -> Result<(), StoreError> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| StoreError::Provider(format!("Invalid bookmarks path: {}", self.path.display())))?;
        let events = self.events.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if relevant {
                    debug!(kind = ?event.kind, "Bookmarks file changed");
                    let _ = events.send(StoreEvent::Changed { id: None });
                }
            }
            Err(e) => warn!(error = %e, "Bookmarks watch error"),
        })
        .map_err(|e| StoreError::Provider(format!("Failed to create watcher: {}", e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| StoreError::Provider(format!("Failed to watch {}: {}", dir.display(), e)))?;

        info!(path = %self.path.display(), "Watching bookmarks file");
        *self.watcher.lock() = Some(watcher);
        Ok(())
    }

    async fn read_document(&self) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::Unavailable(
                format!("No bookmarks file at {}", self.path.display()),
            )),
            Err(e) => Err(StoreError::IoError(e)),
        }
    }

    /// Apply an edit to the raw document and write it back atomically
    async fn mutate<T, F>(&self, edit: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Value) -> Result<T, StoreError> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let content = self.read_document().await?;
        let mut doc: Value = serde_json::from_str(&content)?;
        let out = edit(&mut doc)?;

        // Chromium recomputes the checksum; a stale one would flag the file
        if let Some(obj) = doc.as_object_mut() {
            obj.remove("checksum");
        }

        write_atomically(&self.path, &serde_json::to_vec_pretty(&doc)?).await?;
        Ok(out)
    }

    async fn create_node(
        &self,
        parent_id: Option<&str>,
        title: &str,
        url: Option<&str>,
    ) -> Result<BookmarkNode, StoreError> {
        let parent_id = parent_id.unwrap_or(BOOKMARKS_BAR_ID).to_string();
        let title = title.to_string();
        let url = url.map(str::to_string);
        let now = chrono::Utc::now().timestamp_millis();

        let node = self
            .mutate(move |doc| {
                if parent_id == ROOT_ID {
                    return Err(root_error());
                }
                let id = (max_id(doc) + 1).to_string();
                let parent = root_values_mut(doc)?
                    .into_iter()
                    .find_map(|root| find_value_mut(root, &parent_id))
                    .ok_or_else(|| StoreError::NodeNotFound(parent_id.clone()))?;
                let children = parent
                    .get_mut("children")
                    .and_then(Value::as_array_mut)
                    .ok_or_else(|| StoreError::Provider(format!("Parent {} is not a folder", parent_id)))?;

                let stamp = epoch_ms_to_webkit(now);
                let raw = match &url {
                    Some(url) => json!({
                        "date_added": stamp,
                        "id": id,
                        "name": title,
                        "type": "url",
                        "url": url,
                    }),
                    None => json!({
                        "children": [],
                        "date_added": stamp,
                        "date_modified": "0",
                        "id": id,
                        "name": title,
                        "type": "folder",
                    }),
                };
                let index = children.len() as u32;
                children.push(raw);

                let mut node = match &url {
                    Some(url) => BookmarkNode::bookmark(id, title, url.clone()),
                    None => BookmarkNode::folder(id, title, Vec::new()),
                };
                node.parent_id = Some(parent_id);
                node.index = Some(index);
                node.date_added = Some(now);
                Ok(node)
            })
            .await?;

        self.emit(StoreEvent::Created { id: node.id.clone() });
        Ok(node)
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl BookmarkStore for ChromiumStore {
    async fn fetch_tree(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        let content = self.read_document().await?;
        let raw: RawFile = serde_json::from_str(&content)?;

        let mut top = vec![raw.roots.bookmark_bar.into_node(), raw.roots.other.into_node()];
        if let Some(synced) = raw.roots.synced {
            top.push(synced.into_node());
        }
        let mut tree = vec![BookmarkNode::folder(ROOT_ID, "", top)];
        assign_positions(&mut tree, None);
        debug!(path = %self.path.display(), "Read bookmarks file");
        Ok(tree)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let target = id.to_string();
        self.mutate(move |doc| {
            let roots = root_values_mut(doc)?;
            if target == ROOT_ID || roots.iter().any(|root| value_id(root) == Some(target.as_str())) {
                return Err(root_error());
            }
            let removed = roots.into_iter().any(|root| {
                root.get_mut("children")
                    .and_then(Value::as_array_mut)
                    .map(|children| remove_value(children, &target))
                    .unwrap_or(false)
            });
            if removed {
                Ok(())
            } else {
                Err(StoreError::NodeNotFound(target.clone()))
            }
        })
        .await?;

        info!(node_id = %id, "Removed node from bookmarks file");
        self.emit(StoreEvent::Removed { id: id.to_string() });
        Ok(())
    }

    async fn create_folder(
        &self,
        title: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkNode, StoreError> {
        self.create_node(parent_id, title, None).await
    }

    async fn create_bookmark(
        &self,
        title: &str,
        url: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkNode, StoreError> {
        self.create_node(parent_id, title, Some(url)).await
    }

    fn watch_external_changes(&self) -> Result<(), StoreError> {
        self.watch()
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    async fn open_externally(&self, _url: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
}

fn root_error() -> StoreError {
    StoreError::Provider("Can't modify the root bookmark folders".to_string())
}

fn value_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

fn root_values_mut(doc: &mut Value) -> Result<Vec<&mut Value>, StoreError> {
    let roots = doc
        .get_mut("roots")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StoreError::Provider("Bookmarks file has no roots".to_string()))?;
    Ok(roots.values_mut().filter(|v| v.get("id").is_some()).collect())
}

fn find_value_mut<'a>(node: &'a mut Value, id: &str) -> Option<&'a mut Value> {
    if value_id(node) == Some(id) {
        return Some(node);
    }
    node.get_mut("children")?
        .as_array_mut()?
        .iter_mut()
        .find_map(|child| find_value_mut(child, id))
}

fn remove_value(children: &mut Vec<Value>, id: &str) -> bool {
    if let Some(pos) = children.iter().position(|c| value_id(c) == Some(id)) {
        children.remove(pos);
        return true;
    }
    children.iter_mut().any(|child| {
        child
            .get_mut("children")
            .and_then(Value::as_array_mut)
            .map(|nested| remove_value(nested, id))
            .unwrap_or(false)
    })
}

fn max_id(value: &Value) -> u64 {
    let own = value_id(value).and_then(|id| id.parse::<u64>().ok()).unwrap_or(0);
    let nested = match value {
        Value::Object(map) => map.values().map(max_id).max().unwrap_or(0),
        Value::Array(items) => items.iter().map(max_id).max().unwrap_or(0),
        _ => 0,
    };
    own.max(nested)
}

/// Write through a sibling temp file and rename it over `path`.
///
/// A temp file left behind by a failed rename is removed.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tabmark.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp bookmarks file");
        }
        return Err(StoreError::IoError(e));
    }
    Ok(())
}

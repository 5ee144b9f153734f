//! In-memory bookmark store
//!
//! Stands in for the host bookmark service outside a browser: serves a seed
//! tree after a simulated latency, emits events on every mutation and lets
//! callers inject failures.

use super::{assign_positions, BookmarkStore, StoreEvent, EVENT_CHANNEL_CAPACITY};
use crate::error::StoreError;
use crate::tree::transform::find_by_id;
use crate::tree::BookmarkNode;
use crate::types::{NodeId, BOOKMARKS_BAR_ID, ROOT_ID};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// Latency the development data source simulates by default
pub const DEFAULT_LATENCY_MS: u64 = 100;

pub struct MemoryStore {
    roots: RwLock<Vec<BookmarkNode>>,
    next_id: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
    latency: Duration,
    available: AtomicBool,
    can_open_tabs: AtomicBool,
    fetch_failures: Mutex<VecDeque<StoreError>>,
    remove_failures: Mutex<VecDeque<StoreError>>,
    opened: Mutex<Vec<String>>,
    fetch_count: AtomicUsize,
    remove_count: AtomicUsize,
}

impl MemoryStore {
    /// Create a store seeded with `roots`, answering without latency
    pub fn new(mut roots: Vec<BookmarkNode>) -> Self {
        assign_positions(&mut roots, None);
        let next_id = max_numeric_id(&roots) + 1;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            roots: RwLock::new(roots),
            next_id: AtomicU64::new(next_id),
            events,
            latency: Duration::ZERO,
            available: AtomicBool::new(true),
            can_open_tabs: AtomicBool::new(true),
            fetch_failures: Mutex::new(VecDeque::new()),
            remove_failures: Mutex::new(VecDeque::new()),
            opened: Mutex::new(Vec::new()),
            fetch_count: AtomicUsize::new(0),
            remove_count: AtomicUsize::new(0),
        }
    }

    /// Store seeded with the built-in demo tree
    pub fn demo() -> Self {
        Self::new(demo_tree())
    }

    /// Seed from a JSON file holding an array of nodes
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        let roots: Vec<BookmarkNode> = serde_json::from_str(&content)?;
        Ok(Self::new(roots))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Toggle host availability; unavailable stores fail every call
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_can_open_tabs(&self, can_open: bool) {
        self.can_open_tabs.store(can_open, Ordering::SeqCst);
    }

    pub fn fail_next_fetch(&self, error: StoreError) {
        self.fetch_failures.lock().push_back(error);
    }

    pub fn fail_next_remove(&self, error: StoreError) {
        self.remove_failures.lock().push_back(error);
    }

    /// Replace the whole tree, as an external edit would
    pub fn replace_tree(&self, mut roots: Vec<BookmarkNode>) {
        assign_positions(&mut roots, None);
        self.next_id
            .fetch_max(max_numeric_id(&roots) + 1, Ordering::SeqCst);
        *self.roots.write() = roots;
        self.emit(StoreEvent::Changed { id: None });
    }

    /// Broadcast an event without touching the tree
    pub fn emit(&self, event: StoreEvent) {
        debug!(kind = event.kind(), "Emitting store event");
        let _ = self.events.send(event);
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.remove_count.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<BookmarkNode> {
        self.roots.read().clone()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "bookmark host API not available".to_string(),
            ))
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn allocate_id(&self) -> NodeId {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    /// Build and append a node under `parent_id`; the id is allocated only
    /// once the parent is known to be a folder
    fn insert<F>(&self, parent_id: Option<&str>, build: F) -> Result<BookmarkNode, StoreError>
    where
        F: FnOnce(NodeId) -> BookmarkNode,
    {
        let parent_id = parent_id.unwrap_or(BOOKMARKS_BAR_ID);
        let mut roots = self.roots.write();
        let parent = find_mut(&mut roots, parent_id)
            .ok_or_else(|| StoreError::NodeNotFound(parent_id.to_string()))?;
        let children = parent
            .children
            .as_mut()
            .ok_or_else(|| StoreError::Provider(format!("Parent {} is not a folder", parent_id)))?;
        let mut node = build(self.allocate_id());
        node.parent_id = Some(parent_id.to_string());
        node.index = Some(children.len() as u32);
        node.date_added = Some(chrono::Utc::now().timestamp_millis());
        children.push(node.clone());
        Ok(node)
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn fetch_tree(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        self.ensure_available()?;
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if let Some(error) = self.fetch_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(self.roots.read().clone())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.remove_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if let Some(error) = self.remove_failures.lock().pop_front() {
            return Err(error);
        }
        {
            let mut roots = self.roots.write();
            let node = find_by_id(&roots, id).ok_or_else(|| StoreError::NodeNotFound(id.to_string()))?;
            if is_root_folder(node) {
                return Err(StoreError::Provider(
                    "Can't modify the root bookmark folders".to_string(),
                ));
            }
            remove_from(&mut roots, id);
            assign_positions(&mut roots, None);
        }
        self.emit(StoreEvent::Removed { id: id.to_string() });
        Ok(())
    }

    async fn create_folder(
        &self,
        title: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkNode, StoreError> {
        self.ensure_available()?;
        self.simulate_latency().await;
        let folder = self.insert(parent_id, |id| BookmarkNode::folder(id, title, Vec::new()))?;
        self.emit(StoreEvent::Created { id: folder.id.clone() });
        Ok(folder)
    }

    async fn create_bookmark(
        &self,
        title: &str,
        url: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkNode, StoreError> {
        self.ensure_available()?;
        self.simulate_latency().await;
        let bookmark = self.insert(parent_id, |id| BookmarkNode::bookmark(id, title, url))?;
        self.emit(StoreEvent::Created { id: bookmark.id.clone() });
        Ok(bookmark)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    async fn open_externally(&self, url: &str) -> Result<bool, StoreError> {
        if !self.can_open_tabs.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.opened.lock().push(url.to_string());
        Ok(true)
    }
}

fn is_root_folder(node: &BookmarkNode) -> bool {
    match node.parent_id.as_deref() {
        None => true,
        Some(parent) => parent == ROOT_ID,
    }
}

fn find_mut<'a>(nodes: &'a mut [BookmarkNode], id: &str) -> Option<&'a mut BookmarkNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(children) = node.children.as_mut() {
            if let Some(found) = find_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<BookmarkNode>, id: &str) -> bool {
    if let Some(pos) = nodes.iter().position(|n| n.id == id) {
        nodes.remove(pos);
        return true;
    }
    nodes
        .iter_mut()
        .filter_map(|n| n.children.as_mut())
        .any(|children| remove_from(children, id))
}

fn max_numeric_id(nodes: &[BookmarkNode]) -> u64 {
    nodes
        .iter()
        .map(|n| {
            let own = n.id.parse::<u64>().unwrap_or(0);
            own.max(max_numeric_id(n.child_nodes()))
        })
        .max()
        .unwrap_or(0)
}

/// Demo tree in the host's shape: an untitled root wrapping the top-level folders
pub fn demo_tree() -> Vec<BookmarkNode> {
    let day = 86_400_000;
    let base = 1_704_067_200_000; // 2024-01-01
    vec![BookmarkNode::folder(
        ROOT_ID,
        "",
        vec![
            BookmarkNode::folder(
                "1",
                "Bookmarks bar",
                vec![
                    BookmarkNode::folder(
                        "10",
                        "Dev",
                        vec![
                            BookmarkNode::bookmark("11", "The Rust Book", "https://doc.rust-lang.org/book/")
                                .with_date_added(base + 3 * day),
                            BookmarkNode::bookmark("12", "crates.io", "https://crates.io/")
                                .with_date_added(base + day),
                            BookmarkNode::folder(
                                "13",
                                "Async",
                                vec![BookmarkNode::bookmark("14", "Tokio", "https://tokio.rs/")
                                    .with_date_added(base + 5 * day)],
                            )
                            .with_date_added(base + 2 * day),
                        ],
                    )
                    .with_date_added(base),
                    BookmarkNode::bookmark("15", "Hacker News", "https://news.ycombinator.com/")
                        .with_date_added(base + 4 * day),
                ],
            ),
            BookmarkNode::folder(
                "2",
                "Other bookmarks",
                vec![BookmarkNode::folder(
                    "20",
                    "Recipes",
                    vec![BookmarkNode::bookmark("21", "Sourdough", "https://example.com/sourdough")
                        .with_date_added(base + 6 * day)],
                )
                .with_date_added(base + day)],
            ),
            BookmarkNode::folder("3", "Mobile bookmarks", vec![]),
        ],
    )]
}

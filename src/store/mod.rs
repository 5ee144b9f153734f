//! Bookmark Store
//!
//! The adapter contract between the controller and whatever hierarchical
//! bookmark service backs it. Implementations report changes over a single
//! broadcast stream of [`StoreEvent`]s; dropping the receiver unsubscribes.

pub mod chromium;
pub mod memory;

use crate::error::StoreError;
use crate::tree::BookmarkNode;
use crate::types::NodeId;
use async_trait::async_trait;
use tokio::sync::broadcast;

pub use chromium::ChromiumStore;
pub use memory::MemoryStore;

/// Capacity of each store's event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notification from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { id: NodeId },
    Removed { id: NodeId },
    /// `id` is `None` when the change was only observed at file level
    Changed { id: Option<NodeId> },
    Moved { id: NodeId },
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::Created { .. } => "created",
            StoreEvent::Removed { .. } => "removed",
            StoreEvent::Changed { .. } => "changed",
            StoreEvent::Moved { .. } => "moved",
        }
    }
}

/// Read/query and mutation interface over a bookmark store
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Fetch the full raw tree
    async fn fetch_tree(&self) -> Result<Vec<BookmarkNode>, StoreError>;

    async fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Create a folder; `parent_id` defaults to the bookmarks bar
    async fn create_folder(
        &self,
        title: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkNode, StoreError>;

    async fn create_bookmark(
        &self,
        title: &str,
        url: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkNode, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;

    /// Open a url through the host. `Ok(false)` means the host cannot.
    async fn open_externally(&self, url: &str) -> Result<bool, StoreError>;

    /// Begin reporting edits made outside this process. No-op by default.
    fn watch_external_changes(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Fill `parentId` and `index` from tree position
pub(crate) fn assign_positions(nodes: &mut [BookmarkNode], parent_id: Option<&str>) {
    for (index, node) in nodes.iter_mut().enumerate() {
        node.parent_id = parent_id.map(str::to_string);
        node.index = Some(index as u32);
        let id = node.id.clone();
        if let Some(children) = node.children.as_mut() {
            assign_positions(children, Some(&id));
        }
    }
}

//! Bookmark Tree Controller
//!
//! Owns the authoritative tree, load state, search query and collapse set, and
//! keeps them consistent with the store. Every store event triggers a full
//! reload; each load takes a generation number and only the most recently
//! started load may apply its result.

pub mod context;
pub mod debounce;
pub mod state;

pub use context::{AssumeYes, ControllerContext, RemovalConfirmer, RemovalRequest, SystemOpener, UrlOpener};
pub use debounce::SearchDebouncer;
pub use state::{
    ControllerSettings, LoadOutcome, LoadPhase, Notice, NoticeKind, OpenPath, RemovalOutcome, TreeState,
};

use crate::concurrency::InFlightGuard;
use crate::config::FailurePolicy;
use crate::error::{ApiError, StoreError};
use crate::store::BookmarkStore;
use crate::tree::{transform, BookmarkNode, CollapseState};
use crate::views::{self, ItemView};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const NOTICE_CHANNEL_CAPACITY: usize = 64;

struct ControllerState {
    tree: Vec<BookmarkNode>,
    phase: LoadPhase,
    error: Option<String>,
    query: String,
    collapse: CollapseState,
    generation: u64,
    disposed: bool,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            tree: Vec::new(),
            phase: LoadPhase::Idle,
            error: None,
            query: String::new(),
            collapse: CollapseState::new(),
            generation: 0,
            disposed: false,
        }
    }

    /// The tree as currently observable; nothing while a load is outstanding
    fn visible_tree(&self) -> &[BookmarkNode] {
        match self.phase {
            LoadPhase::Loading => &[],
            _ => &self.tree,
        }
    }
}

pub struct BookmarkTreeController {
    store: Arc<dyn BookmarkStore>,
    context: ControllerContext,
    settings: ControllerSettings,
    state: RwLock<ControllerState>,
    debouncer: SearchDebouncer,
    removals: InFlightGuard,
    revision: watch::Sender<u64>,
    notices: broadcast::Sender<Notice>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl BookmarkTreeController {
    pub fn new(store: Arc<dyn BookmarkStore>, context: ControllerContext, settings: ControllerSettings) -> Self {
        let (revision, _) = watch::channel(0);
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            store,
            context,
            debouncer: SearchDebouncer::new(settings.search_debounce),
            settings,
            state: RwLock::new(ControllerState::new()),
            removals: InFlightGuard::new(),
            revision,
            notices,
            listener: Mutex::new(None),
        }
    }

    /// Subscribe to store events, then run the initial load.
    ///
    /// Calling `start` again only reloads.
    pub async fn start(self: &Arc<Self>) -> LoadOutcome {
        {
            let mut listener = self.listener.lock();
            if listener.is_none() && !self.is_disposed() {
                let events = self.store.subscribe();
                *listener = Some(tokio::spawn(Self::listen(Arc::downgrade(self), events)));
                debug!("Subscribed to bookmark store events");
            }
        }
        self.load().await
    }

    async fn listen(controller: Weak<Self>, mut events: broadcast::Receiver<crate::store::StoreEvent>) {
        loop {
            let reason = match events.recv().await {
                Ok(event) => event.kind(),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Store event listener lagged");
                    "lagged"
                }
                Err(RecvError::Closed) => break,
            };
            let Some(controller) = controller.upgrade() else {
                break;
            };
            if controller.is_disposed() {
                break;
            }
            debug!(reason, "Store changed; reloading");
            tokio::spawn(async move {
                controller.load().await;
            });
        }
        debug!("Store event listener stopped");
    }

    /// Fetch the full tree and make it authoritative.
    ///
    /// Store failures never escape; they become the observable state and a
    /// notice. No retries.
    pub async fn load(&self) -> LoadOutcome {
        let generation = {
            let mut state = self.state.write();
            if state.disposed {
                return LoadOutcome::Disposed;
            }
            state.generation += 1;
            state.phase = LoadPhase::Loading;
            state.error = None;
            state.generation
        };
        self.bump_revision();
        info!(generation, "Loading bookmark tree");

        let result = self.store.fetch_tree().await;

        let mut state = self.state.write();
        if state.disposed {
            return LoadOutcome::Disposed;
        }
        if state.generation != generation {
            debug!(generation, latest = state.generation, "Discarding superseded load");
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(raw) => {
                let tree = transform::prepare(&raw);
                state.collapse.auto_collapse(&tree, self.settings.collapse_depth);
                info!(
                    generation,
                    root_count = tree.len(),
                    collapsed = state.collapse.len(),
                    "Bookmark tree loaded"
                );
                state.tree = tree;
                state.phase = LoadPhase::Loaded;
                state.error = None;
                drop(state);
                self.bump_revision();
                LoadOutcome::Applied
            }
            Err(err) => {
                let message = err.to_string();
                warn!(generation, error = %message, "Failed to load bookmark tree");
                state.phase = LoadPhase::Failed;
                state.error = Some(message.clone());
                if self.settings.failure_policy == FailurePolicy::Clear {
                    state.tree.clear();
                    state.collapse.clear();
                }
                drop(state);
                let kind = if err.is_unavailable() {
                    NoticeKind::StoreUnavailable
                } else {
                    NoticeKind::StoreError
                };
                self.notify(Notice::new(kind, message));
                self.bump_revision();
                LoadOutcome::Failed
            }
        }
    }

    pub fn snapshot(&self) -> TreeState {
        let state = self.state.read();
        TreeState {
            tree: state.visible_tree().to_vec(),
            loading: state.phase == LoadPhase::Loading,
            error: state.error.clone(),
            phase: state.phase,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.read().phase
    }

    /// Update the query; filtering follows immediately, the settled query
    /// after the debounce period.
    pub fn set_query(&self, query: &str) {
        {
            let mut state = self.state.write();
            if state.disposed {
                return;
            }
            state.query = query.to_string();
        }
        self.debouncer.push(query);
        self.bump_revision();
    }

    pub fn query(&self) -> String {
        self.state.read().query.clone()
    }

    pub fn settled_query(&self) -> String {
        self.debouncer.settled()
    }

    /// Settled queries, distinct-until-changed
    pub fn subscribe_settled_query(&self) -> watch::Receiver<String> {
        self.debouncer.subscribe()
    }

    /// The authoritative tree filtered by the current query, recomputed per call
    pub fn get_filtered_tree(&self) -> Vec<BookmarkNode> {
        let state = self.state.read();
        transform::filter_tree(state.visible_tree(), &state.query)
    }

    /// Flip a folder; returns whether it is now collapsed
    pub fn toggle_folder(&self, id: &str) -> bool {
        let collapsed = {
            let mut state = self.state.write();
            if state.disposed {
                return state.collapse.is_collapsed(id);
            }
            state.collapse.toggle(id)
        };
        debug!(node_id = id, collapsed, "Toggled folder");
        self.bump_revision();
        collapsed
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.state.read().collapse.is_collapsed(id)
    }

    /// Expand every folder
    pub fn expand_all(&self) {
        {
            let mut state = self.state.write();
            if state.disposed {
                return;
            }
            state.collapse.clear();
        }
        self.bump_revision();
    }

    /// Rows for the filtered tree under the current collapse set
    pub fn visible_rows(&self) -> Vec<ItemView> {
        let state = self.state.read();
        let filtered = transform::filter_tree(state.visible_tree(), &state.query);
        views::visible_rows(&filtered, &state.collapse)
    }

    pub fn find_node(&self, id: &str) -> Option<BookmarkNode> {
        transform::find_by_id(&self.state.read().tree, id).cloned()
    }

    /// Remove a node after confirmation.
    ///
    /// Protected nodes are rejected before the confirmer or the store is
    /// consulted. On failure the authoritative tree is left as it was.
    pub async fn remove_node(&self, node: &BookmarkNode) -> Result<RemovalOutcome, ApiError> {
        if let Some(reason) = node.removal_blocker() {
            warn!(node_id = %node.id, reason = %reason, "Refusing to remove protected node");
            self.notify(Notice::new(NoticeKind::NotRemovable, reason.clone()));
            return Err(ApiError::NotRemovable {
                id: node.id.clone(),
                reason,
            });
        }

        let _permit = self
            .removals
            .try_acquire(&node.id)
            .ok_or_else(|| ApiError::RemovalInProgress(node.id.clone()))?;

        let request = RemovalRequest::for_node(node);
        if !self.context.confirmer.confirm(&request).await {
            info!(node_id = %node.id, "Removal declined");
            return Ok(RemovalOutcome::Declined);
        }

        match self.store.remove(&node.id).await {
            Ok(()) => {
                info!(node_id = %node.id, kind = %request.kind, "Removed node");
                self.load().await;
                Ok(RemovalOutcome::Removed)
            }
            Err(source) => {
                warn!(node_id = %node.id, error = %source, "Removal failed");
                self.notify(Notice::new(
                    NoticeKind::RemovalFailed,
                    format!("Could not remove \"{}\": {}", node.title, source),
                ));
                Err(ApiError::RemovalFailed {
                    id: node.id.clone(),
                    source,
                })
            }
        }
    }

    /// [`remove_node`](Self::remove_node) by id, looked up in the authoritative tree
    pub async fn remove_by_id(&self, id: &str) -> Result<RemovalOutcome, ApiError> {
        let node = self
            .find_node(id)
            .ok_or_else(|| ApiError::Store(StoreError::NodeNotFound(id.to_string())))?;
        self.remove_node(&node).await
    }

    /// Open through the store if it can, else through the fallback opener
    pub async fn open_node(&self, url: &str) -> Result<OpenPath, ApiError> {
        match self.store.open_externally(url).await {
            Ok(true) => {
                debug!(url, "Opened through store");
                return Ok(OpenPath::Store);
            }
            Ok(false) => {}
            Err(err) => {
                debug!(url, error = %err, "Store could not open url");
            }
        }
        self.context.opener.open(url).await?;
        Ok(OpenPath::Fallback)
    }

    pub async fn create_folder(&self, title: &str, parent_id: Option<&str>) -> Result<BookmarkNode, ApiError> {
        let folder = self.store.create_folder(title, parent_id).await?;
        info!(node_id = %folder.id, "Created folder");
        Ok(folder)
    }

    pub async fn create_bookmark(
        &self,
        title: &str,
        url: &str,
        parent_id: Option<&str>,
    ) -> Result<BookmarkNode, ApiError> {
        let bookmark = self.store.create_bookmark(title, url, parent_id).await?;
        info!(node_id = %bookmark.id, "Created bookmark");
        Ok(bookmark)
    }

    /// Most recently added bookmarks; `None` uses the configured count
    pub fn recent_bookmarks(&self, count: Option<usize>) -> Vec<BookmarkNode> {
        let count = count.unwrap_or(self.settings.recent_count);
        transform::recent_bookmarks(&self.state.read().tree, count)
    }

    /// Children of a folder; `None` means the bookmarks bar
    pub fn folder_children(&self, folder_id: Option<&str>) -> Vec<BookmarkNode> {
        transform::folder_children(&self.state.read().tree, folder_id)
    }

    pub fn has_bookmark_content(&self) -> bool {
        transform::has_bookmark_content(&self.state.read().tree)
    }

    /// Bumped on every state change
    pub fn subscribe_revisions(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Release the store subscription and the debounce timer.
    ///
    /// In-flight loads complete but no longer touch state; queries, toggles
    /// and expansions become no-ops.
    pub fn dispose(&self) {
        {
            let mut state = self.state.write();
            if state.disposed {
                return;
            }
            state.disposed = true;
        }
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        self.debouncer.close();
        info!("Bookmark tree controller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.state.read().disposed
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn notify(&self, notice: Notice) {
        // no subscribers is fine
        let _ = self.notices.send(notice);
    }
}

impl Drop for BookmarkTreeController {
    fn drop(&mut self) {
        self.dispose();
    }
}

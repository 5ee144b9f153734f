//! Observable controller state and settings

use crate::config::{FailurePolicy, ViewConfig};
use crate::tree::BookmarkNode;
use serde::Serialize;
use std::time::Duration;

/// Load state machine: `Idle -> Loading -> {Loaded, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Snapshot of what the user currently sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeState {
    /// Authoritative tree; empty while loading
    pub tree: Vec<BookmarkNode>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: LoadPhase,
}

/// How a single `load()` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Result became the authoritative tree
    Applied,
    /// Store failed; the failure is now the observable state
    Failed,
    /// A newer load started before this one finished
    Superseded,
    /// Controller was disposed
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    Declined,
}

/// Which path `open_node` took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenPath {
    Store,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    StoreUnavailable,
    StoreError,
    RemovalFailed,
    NotRemovable,
}

/// User-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub search_debounce: Duration,
    pub collapse_depth: usize,
    pub failure_policy: FailurePolicy,
    pub recent_count: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&ViewConfig::default())
    }
}

impl From<&ViewConfig> for ControllerSettings {
    fn from(view: &ViewConfig) -> Self {
        Self {
            search_debounce: Duration::from_millis(view.search_debounce_ms),
            collapse_depth: view.collapse_depth,
            failure_policy: view.failure_policy,
            recent_count: view.recent_count,
        }
    }
}

impl ControllerSettings {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }
}

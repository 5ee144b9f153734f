//! Collaborators injected into the controller at construction

use crate::error::ApiError;
use crate::tree::{BookmarkNode, NodeKind};
use crate::types::NodeId;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// What the user is asked to confirm before a removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
}

impl RemovalRequest {
    pub fn for_node(node: &BookmarkNode) -> Self {
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            kind: node.kind(),
        }
    }

    /// Prompt text, e.g. `Remove folder "Work"?`
    pub fn prompt(&self) -> String {
        format!("Remove {} \"{}\"?", self.kind, self.title)
    }
}

/// Gate in front of every destructive store call
#[async_trait]
pub trait RemovalConfirmer: Send + Sync {
    async fn confirm(&self, request: &RemovalRequest) -> bool;
}

/// Confirms everything; for `--yes` and non-interactive use
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

#[async_trait]
impl RemovalConfirmer for AssumeYes {
    async fn confirm(&self, request: &RemovalRequest) -> bool {
        debug!(node_id = %request.id, "Removal auto-confirmed");
        true
    }
}

/// Generic open-URL action used when the store cannot open tabs
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), ApiError>;
}

/// Hands urls to the platform opener command
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(url: &str) -> std::process::Command {
        if cfg!(target_os = "macos") {
            let mut cmd = std::process::Command::new("open");
            cmd.arg(url);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = std::process::Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        } else {
            let mut cmd = std::process::Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

#[async_trait]
impl UrlOpener for SystemOpener {
    async fn open(&self, url: &str) -> Result<(), ApiError> {
        debug!(url, "Opening url with system opener");
        Self::command(url)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| ApiError::OpenFailed(format!("{}: {}", url, e)))
    }
}

/// Per-controller collaborators
#[derive(Clone)]
pub struct ControllerContext {
    pub confirmer: Arc<dyn RemovalConfirmer>,
    pub opener: Arc<dyn UrlOpener>,
}

impl ControllerContext {
    pub fn new(confirmer: Arc<dyn RemovalConfirmer>, opener: Arc<dyn UrlOpener>) -> Self {
        Self { confirmer, opener }
    }

    /// `confirmer` plus the platform opener
    pub fn with_confirmer(confirmer: Arc<dyn RemovalConfirmer>) -> Self {
        Self::new(confirmer, Arc::new(SystemOpener))
    }
}

impl std::fmt::Debug for ControllerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext").finish_non_exhaustive()
    }
}

//! Bookmark tree model and pure transforms

pub mod collapse;
pub mod node;
pub mod transform;

pub use collapse::{CollapseState, DEFAULT_COLLAPSE_DEPTH};
pub use node::{BookmarkNode, FolderType, NodeKind};

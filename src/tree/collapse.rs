//! Collapse state
//!
//! The set of folder ids whose children are hidden. Rebuilt by
//! [`CollapseState::auto_collapse`] after every successful load and otherwise
//! changed only by explicit toggles. Never persisted.

use crate::tree::node::BookmarkNode;
use crate::types::NodeId;
use std::collections::HashSet;

/// Default depth (0-indexed from the roots) at which folders start collapsed
pub const DEFAULT_COLLAPSE_DEPTH: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed: HashSet<NodeId>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with every folder at `depth >= min_depth`.
    pub fn auto_collapse(&mut self, tree: &[BookmarkNode], min_depth: usize) {
        self.collapsed.clear();
        self.collect(tree, 0, min_depth);
    }

    fn collect(&mut self, nodes: &[BookmarkNode], depth: usize, min_depth: usize) {
        for node in nodes {
            if !node.is_folder() {
                continue;
            }
            if depth >= min_depth {
                self.collapsed.insert(node.id.clone());
            }
            self.collect(node.child_nodes(), depth + 1, min_depth);
        }
    }

    /// Flip membership; returns whether the folder is now collapsed.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.collapsed.remove(id) {
            false
        } else {
            self.collapsed.insert(id.to_string());
            true
        }
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    pub fn clear(&mut self) {
        self.collapsed.clear();
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.collapsed.iter()
    }
}

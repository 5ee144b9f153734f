//! Tree transforms
//!
//! Pure functions over bookmark trees. Every transform takes a borrowed tree
//! and returns a new one; node ids always pass through untouched.

use crate::tree::node::{BookmarkNode, FolderType};
use crate::types::BOOKMARKS_BAR_ID;
use tracing::{debug, warn};

/// Repair nodes that violate the folder XOR bookmark shape.
///
/// A node with a url drops any children; a node with neither url nor
/// children becomes an empty folder.
pub fn normalize(tree: &[BookmarkNode]) -> Vec<BookmarkNode> {
    tree.iter().map(normalize_node).collect()
}

fn normalize_node(node: &BookmarkNode) -> BookmarkNode {
    let mut out = node.clone();
    match (&node.url, &node.children) {
        (Some(_), Some(_)) => {
            warn!(node_id = %node.id, "Bookmark carried children; dropping them");
            out.children = None;
        }
        (None, None) => {
            warn!(node_id = %node.id, "Folder arrived without children; treating as empty");
            out.children = Some(Vec::new());
        }
        (None, Some(children)) => {
            out.children = Some(normalize(children));
        }
        (Some(_), None) => {}
    }
    out
}

/// Annotate every folder with its `FolderType`; leaves carry none.
pub fn tag_folder_types(tree: &[BookmarkNode]) -> Vec<BookmarkNode> {
    tree.iter()
        .map(|node| {
            let mut out = node.clone();
            if node.is_folder() {
                out.folder_type = Some(FolderType::from_title(&node.title));
                out.children = node.children.as_deref().map(tag_folder_types);
            } else {
                out.folder_type = None;
            }
            out
        })
        .collect()
}

/// Folders first, then bookmarks; each group ascending by `dateAdded`.
///
/// The sort is stable, so siblings with equal dates keep store order.
pub fn sort_tree(tree: &[BookmarkNode]) -> Vec<BookmarkNode> {
    let (mut folders, mut bookmarks): (Vec<BookmarkNode>, Vec<BookmarkNode>) =
        tree.iter().cloned().partition(BookmarkNode::is_folder);

    folders.sort_by_key(BookmarkNode::sort_date);
    bookmarks.sort_by_key(BookmarkNode::sort_date);

    for folder in &mut folders {
        if let Some(children) = folder.children.take() {
            folder.children = Some(sort_tree(&children));
        }
    }

    folders.extend(bookmarks);
    folders
}

/// Full post-fetch pipeline: normalize, tag, sort
pub fn prepare(raw: &[BookmarkNode]) -> Vec<BookmarkNode> {
    let tree = sort_tree(&tag_folder_types(&normalize(raw)));
    debug!(root_count = tree.len(), "Prepared bookmark tree");
    tree
}

/// Case-insensitive substring filter, decided bottom-up.
///
/// A folder survives when its title matches or any descendant survives, and
/// carries only its surviving children. A whitespace-only query is no filter.
pub fn filter_tree(tree: &[BookmarkNode], query: &str) -> Vec<BookmarkNode> {
    let needle = query.trim();
    if needle.is_empty() {
        return tree.to_vec();
    }
    filter_nodes(tree, &needle.to_lowercase())
}

fn filter_nodes(tree: &[BookmarkNode], needle: &str) -> Vec<BookmarkNode> {
    let mut filtered = Vec::new();
    for node in tree {
        let title_matches = node.title.to_lowercase().contains(needle);
        match &node.children {
            Some(children) => {
                let kept = filter_nodes(children, needle);
                if title_matches || !kept.is_empty() {
                    let mut out = node.clone();
                    out.children = Some(kept);
                    filtered.push(out);
                }
            }
            None => {
                let url_matches = node
                    .url
                    .as_deref()
                    .map(|url| url.to_lowercase().contains(needle))
                    .unwrap_or(false);
                if title_matches || url_matches {
                    filtered.push(node.clone());
                }
            }
        }
    }
    filtered
}

/// Every leaf bookmark, depth-first
pub fn flatten_bookmarks(tree: &[BookmarkNode]) -> Vec<&BookmarkNode> {
    let mut flattened = Vec::new();
    collect_bookmarks(tree, &mut flattened);
    flattened
}

fn collect_bookmarks<'a>(tree: &'a [BookmarkNode], out: &mut Vec<&'a BookmarkNode>) {
    for node in tree {
        if node.url.is_some() {
            out.push(node);
        }
        if let Some(children) = &node.children {
            collect_bookmarks(children, out);
        }
    }
}

pub fn find_by_id<'a>(tree: &'a [BookmarkNode], id: &str) -> Option<&'a BookmarkNode> {
    for node in tree {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = node.children.as_deref().and_then(|c| find_by_id(c, id)) {
            return Some(found);
        }
    }
    None
}

/// Whether the tree holds at least one bookmark anywhere
pub fn has_bookmark_content(tree: &[BookmarkNode]) -> bool {
    tree.iter()
        .any(|node| node.url.is_some() || has_bookmark_content(node.child_nodes()))
}

/// Most recently added bookmarks first
pub fn recent_bookmarks(tree: &[BookmarkNode], count: usize) -> Vec<BookmarkNode> {
    let mut leaves: Vec<&BookmarkNode> = flatten_bookmarks(tree);
    leaves.sort_by(|a, b| b.sort_date().cmp(&a.sort_date()));
    leaves.into_iter().take(count).cloned().collect()
}

/// Children of a folder; defaults to the bookmarks bar
pub fn folder_children(tree: &[BookmarkNode], folder_id: Option<&str>) -> Vec<BookmarkNode> {
    let id = folder_id.unwrap_or(BOOKMARKS_BAR_ID);
    find_by_id(tree, id)
        .map(|folder| folder.child_nodes().to_vec())
        .unwrap_or_default()
}

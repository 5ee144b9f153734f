//! Item Views
//!
//! Display-ready rows derived from a (filtered) tree and the collapse set.
//! Rows are produced depth-first; descendants of collapsed folders are
//! omitted.

use crate::tree::{BookmarkNode, CollapseState};
use crate::types::{NodeId, Timestamp};
use chrono::{Local, TimeZone};
use serde::Serialize;

/// One rendered row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: NodeId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub depth: usize,
    pub is_folder: bool,
    pub collapsed: bool,
    /// Direct children of a folder, zero for bookmarks
    pub item_count: usize,
    pub favicon_url: String,
    pub date_label: String,
    pub removable: bool,
}

impl ItemView {
    pub fn from_node(node: &BookmarkNode, depth: usize, collapse: &CollapseState) -> Self {
        let url = node.url.clone();
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            favicon_url: url.as_deref().map(favicon_url).unwrap_or_default(),
            url,
            depth,
            is_folder: node.is_folder(),
            collapsed: node.is_folder() && collapse.is_collapsed(&node.id),
            item_count: node.child_nodes().len(),
            date_label: format_date_label(node.date_added),
            removable: node.is_removable(),
        }
    }
}

/// Flatten `tree` into rows, skipping the insides of collapsed folders
pub fn visible_rows(tree: &[BookmarkNode], collapse: &CollapseState) -> Vec<ItemView> {
    let mut rows = Vec::new();
    push_rows(tree, 0, collapse, &mut rows);
    rows
}

fn push_rows(nodes: &[BookmarkNode], depth: usize, collapse: &CollapseState, rows: &mut Vec<ItemView>) {
    for node in nodes {
        let row = ItemView::from_node(node, depth, collapse);
        let descend = row.is_folder && !row.collapsed;
        rows.push(row);
        if descend {
            push_rows(node.child_nodes(), depth + 1, collapse, rows);
        }
    }
}

/// `<origin>/favicon.ico`, or empty when the url has no usable origin
pub fn favicon_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) => {
            let origin = parsed.origin();
            if origin.is_tuple() {
                format!("{}/favicon.ico", origin.ascii_serialization())
            } else {
                String::new()
            }
        }
        Err(_) => String::new(),
    }
}

/// Local calendar date of an epoch-millisecond timestamp; empty when unset
pub fn format_date_label(date_added: Option<Timestamp>) -> String {
    match date_added {
        Some(ms) if ms > 0 => Local
            .timestamp_millis_opt(ms)
            .single()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

//! Bookmark node types

use crate::types::{NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived folder tag, assigned from the folder title on every load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FolderType {
    BookmarksBar,
    Other,
    Default,
}

impl FolderType {
    /// Classify a folder by its title
    pub fn from_title(title: &str) -> Self {
        match title {
            "Bookmarks bar" => FolderType::BookmarksBar,
            "Other bookmarks" => FolderType::Other,
            _ => FolderType::Default,
        }
    }

    /// Top-level host folders that must never be removed
    pub fn is_protected(&self) -> bool {
        matches!(self, FolderType::BookmarksBar | FolderType::Other)
    }
}

/// Bookmark or folder, as named in removal prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Bookmark,
    Folder,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Bookmark => write!(f, "bookmark"),
            NodeKind::Folder => write!(f, "folder"),
        }
    }
}

/// A bookmark (leaf, has `url`) or a folder (has `children`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_group_modified: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_type: Option<FolderType>,
}

impl BookmarkNode {
    /// Create a folder node
    pub fn folder(id: impl Into<NodeId>, title: impl Into<String>, children: Vec<BookmarkNode>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            children: Some(children),
            date_added: None,
            date_group_modified: None,
            parent_id: None,
            index: None,
            folder_type: None,
        }
    }

    /// Create a bookmark leaf
    pub fn bookmark(id: impl Into<NodeId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            children: None,
            date_added: None,
            date_group_modified: None,
            parent_id: None,
            index: None,
            folder_type: None,
        }
    }

    pub fn with_date_added(mut self, date_added: Timestamp) -> Self {
        self.date_added = Some(date_added);
        self
    }

    /// Folders are exactly the nodes without a url
    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }

    pub fn kind(&self) -> NodeKind {
        if self.url.is_some() {
            NodeKind::Bookmark
        } else {
            NodeKind::Folder
        }
    }

    /// Children of a folder, empty for leaves
    pub fn child_nodes(&self) -> &[BookmarkNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Sort key; missing dates sort as oldest
    pub fn sort_date(&self) -> Timestamp {
        self.date_added.unwrap_or(0)
    }

    /// Why this node cannot be removed, if it cannot
    pub fn removal_blocker(&self) -> Option<String> {
        // untagged nodes are classified on the spot
        let folder_type = self
            .folder_type
            .or_else(|| self.is_folder().then(|| FolderType::from_title(&self.title)));
        if folder_type.is_some_and(|t| t.is_protected()) {
            return Some(format!("'{}' is a protected root folder", self.title));
        }
        if self.title.is_empty() {
            return Some("untitled root containers are not removable".to_string());
        }
        None
    }

    pub fn is_removable(&self) -> bool {
        self.removal_blocker().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_type_from_title() {
        assert_eq!(FolderType::from_title("Bookmarks bar"), FolderType::BookmarksBar);
        assert_eq!(FolderType::from_title("Other bookmarks"), FolderType::Other);
        assert_eq!(FolderType::from_title("bookmarks bar"), FolderType::Default);
        assert_eq!(FolderType::from_title(""), FolderType::Default);
    }

    #[test]
    fn test_kind_follows_url() {
        let leaf = BookmarkNode::bookmark("2", "News", "http://news.example");
        let folder = BookmarkNode::folder("1", "Work", vec![]);
        assert_eq!(leaf.kind(), NodeKind::Bookmark);
        assert_eq!(folder.kind(), NodeKind::Folder);
        assert_eq!(leaf.kind().to_string(), "bookmark");
        assert_eq!(folder.kind().to_string(), "folder");
    }

    #[test]
    fn test_protected_and_untitled_nodes_are_not_removable() {
        let mut bar = BookmarkNode::folder("1", "Bookmarks bar", vec![]);
        bar.folder_type = Some(FolderType::BookmarksBar);
        let mut other = BookmarkNode::folder("2", "Other bookmarks", vec![]);
        other.folder_type = Some(FolderType::Other);
        let root = BookmarkNode::folder("0", "", vec![]);
        let mut work = BookmarkNode::folder("10", "Work", vec![]);
        work.folder_type = Some(FolderType::Default);

        assert!(!bar.is_removable());
        assert!(!other.is_removable());
        assert!(!root.is_removable());
        assert!(work.is_removable());
        assert!(BookmarkNode::bookmark("3", "News", "http://x").is_removable());
    }

    #[test]
    fn test_untagged_root_folder_is_protected() {
        let other = BookmarkNode::folder("2", "Other bookmarks", vec![]);
        assert!(other.removal_blocker().is_some());
        let leaf = BookmarkNode::bookmark("9", "Other bookmarks", "http://x");
        assert!(leaf.is_removable());
    }

    #[test]
    fn test_serializes_with_host_field_names() {
        let mut node = BookmarkNode::folder("1", "Bookmarks bar", vec![]).with_date_added(5);
        node.folder_type = Some(FolderType::BookmarksBar);
        node.parent_id = Some("0".to_string());
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["folderType"], "bookmarks-bar");
        assert_eq!(json["dateAdded"], 5);
        assert_eq!(json["parentId"], "0");
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_deserializes_host_payload() {
        let node: BookmarkNode = serde_json::from_str(
            r#"{"id":"1","title":"Work","children":[{"id":"2","title":"Resume","url":"http://x","dateAdded":17}]}"#,
        )
        .unwrap();
        assert!(node.is_folder());
        assert_eq!(node.child_nodes().len(), 1);
        assert_eq!(node.child_nodes()[0].date_added, Some(17));
        assert_eq!(node.folder_type, None);
    }
}

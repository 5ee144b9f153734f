//! Format trees, recent lists and notices for the terminal.

use crate::controller::{Notice, TreeState};
use crate::error::ApiError;
use crate::tree::BookmarkNode;
use crate::views::{format_date_label, ItemView};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Indented tree; folders bold with a collapse marker, urls dimmed
pub fn format_tree_text(rows: &[ItemView], state: &TreeState, query: &str) -> String {
    let mut out = String::new();
    let heading = if query.trim().is_empty() {
        "Bookmarks".to_string()
    } else {
        format!("Bookmarks matching \"{}\"", query.trim())
    };
    out.push_str(&format!("{}\n\n", format_section_heading(&heading)));

    if let Some(error) = &state.error {
        out.push_str(&format!("{} {}\n\n", "error:".red().bold(), error));
    }
    if rows.is_empty() {
        out.push_str("  (no bookmarks)\n");
        return out;
    }

    for row in rows {
        let indent = "  ".repeat(row.depth + 1);
        if row.is_folder {
            let marker = if row.collapsed { "▸" } else { "▾" };
            let title = if row.title.is_empty() { "(root)" } else { row.title.as_str() };
            out.push_str(&format!(
                "{}{} {} ({}) {}\n",
                indent,
                marker,
                title.bold(),
                row.item_count,
                format!("[{}]", row.id).dimmed()
            ));
        } else {
            out.push_str(&format!(
                "{}• {}  {} {}\n",
                indent,
                row.title,
                row.url.as_deref().unwrap_or_default().dimmed(),
                format!("[{}]", row.id).dimmed()
            ));
        }
    }
    out
}

pub fn format_tree_json(rows: &[ItemView], state: &TreeState, query: &str) -> Result<String, ApiError> {
    let out = json!({
        "phase": state.phase,
        "error": state.error,
        "query": query.trim(),
        "rows": rows,
    });
    serde_json::to_string_pretty(&out).map_err(|e| ApiError::Store(e.into()))
}

/// Recent bookmarks as a table
pub fn format_recent_table(nodes: &[BookmarkNode]) -> String {
    if nodes.is_empty() {
        return "No bookmarks found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Added", "Title", "URL", "ID"]);
    for node in nodes {
        let added = format_date_label(node.date_added);
        table.add_row(vec![
            if added.is_empty() { "-".to_string() } else { added },
            node.title.clone(),
            node.url.clone().unwrap_or_default(),
            node.id.clone(),
        ]);
    }
    format!("{}\n\n{}", format_section_heading("Recently added"), table)
}

pub fn format_recent_json(nodes: &[BookmarkNode]) -> Result<String, ApiError> {
    let out = json!({ "bookmarks": nodes, "total": nodes.len() });
    serde_json::to_string_pretty(&out).map_err(|e| ApiError::Store(e.into()))
}

pub fn format_notice(notice: &Notice) -> String {
    format!("{} {}", "notice:".yellow().bold(), notice.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{LoadPhase, NoticeKind};
    use crate::tree::CollapseState;
    use crate::views::visible_rows;

    fn loaded(tree: Vec<BookmarkNode>) -> TreeState {
        TreeState {
            tree,
            loading: false,
            error: None,
            phase: LoadPhase::Loaded,
        }
    }

    #[test]
    fn test_tree_text_lists_rows() {
        let tree = vec![BookmarkNode::folder(
            "1",
            "Work",
            vec![BookmarkNode::bookmark("2", "Resume", "http://x")],
        )];
        let rows = visible_rows(&tree, &CollapseState::new());
        let text = format_tree_text(&rows, &loaded(tree), "");
        assert!(text.contains("Work"));
        assert!(text.contains("Resume"));
        assert!(text.contains("http://x"));
        assert!(text.contains("[2]"));
    }

    #[test]
    fn test_tree_text_shows_error_and_empty_marker() {
        let state = TreeState {
            tree: vec![],
            loading: false,
            error: Some("Bookmark store unavailable: gone".to_string()),
            phase: LoadPhase::Failed,
        };
        let text = format_tree_text(&[], &state, "rust");
        assert!(text.contains("gone"));
        assert!(text.contains("(no bookmarks)"));
        assert!(text.contains("rust"));
    }

    #[test]
    fn test_tree_json_shape() {
        let tree = vec![BookmarkNode::bookmark("2", "Resume", "http://x")];
        let rows = visible_rows(&tree, &CollapseState::new());
        let out = format_tree_json(&rows, &loaded(tree), " res ").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["phase"], "loaded");
        assert_eq!(value["query"], "res");
        assert_eq!(value["rows"][0]["id"], "2");
        assert_eq!(value["rows"][0]["favicon_url"], "http://x/favicon.ico");
    }

    #[test]
    fn test_recent_table() {
        assert_eq!(format_recent_table(&[]), "No bookmarks found.");
        let nodes = vec![BookmarkNode::bookmark("2", "Resume", "http://x")];
        let table = format_recent_table(&nodes);
        assert!(table.contains("Resume"));
        assert!(table.contains("-"));
    }

    #[test]
    fn test_notice_message() {
        let notice = Notice::new(NoticeKind::RemovalFailed, "could not remove");
        assert!(format_notice(&notice).contains("could not remove"));
    }
}

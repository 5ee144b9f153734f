//! Core types shared across the bookmark engine.

/// NodeId: opaque store identifier, stable while the store keeps the node
pub type NodeId = String;

/// Timestamp: epoch milliseconds
pub type Timestamp = i64;

/// Id of the synthetic root that wraps the host's top-level folders
pub const ROOT_ID: &str = "0";

/// Id the host assigns to the bookmarks bar; default parent for new nodes
pub const BOOKMARKS_BAR_ID: &str = "1";

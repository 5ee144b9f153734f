//! Tabmark: Bookmark Tree Reconciliation
//!
//! Loads a bookmark tree from a hierarchical store, derives the tagged, sorted
//! and filtered view a user sees, and keeps that view consistent while the
//! store changes underneath it.

pub mod concurrency;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod views;

pub use controller::{BookmarkTreeController, ControllerContext, ControllerSettings, LoadPhase, TreeState};
pub use error::{ApiError, StoreError};
pub use store::{BookmarkStore, StoreEvent};
pub use tree::BookmarkNode;

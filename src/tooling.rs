//! Tooling & Integration Layer
//!
//! The command-line surface over the controller and its terminal formatting.

pub mod cli;
pub mod format;

pub use cli::{build_store, Cli, CliContext, Commands, TerminalConfirmer};

//! Configuration
//!
//! Layered configuration built with the `config` crate: defaults, the global
//! config file (or an explicit file), then `TABMARK_*` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabmarkConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TabmarkConfig {
    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

/// Which adapter backs the bookmark tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Chromium,
    Memory,
}

/// Store adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Chromium `Bookmarks` file; None means the platform default profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmarks_file: Option<PathBuf>,

    /// JSON seed for the memory backend; None means the built-in demo tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_file: Option<PathBuf>,

    /// Simulated latency of the memory backend
    #[serde(default = "default_mock_latency_ms")]
    pub mock_latency_ms: u64,
}

fn default_mock_latency_ms() -> u64 {
    crate::store::memory::DEFAULT_LATENCY_MS
}

impl StoreConfig {
    /// Resolve the Chromium bookmarks file to read
    pub fn resolve_bookmarks_file(&self) -> Result<PathBuf, ApiError> {
        if let Some(path) = &self.bookmarks_file {
            return Ok(path.clone());
        }
        paths::default_bookmarks_file().ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine the default browser profile directory".to_string(),
            )
        })
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            bookmarks_file: None,
            mock_file: None,
            mock_latency_ms: default_mock_latency_ms(),
        }
    }
}

/// What happens to the loaded tree when a reload fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep showing the last good tree next to the error
    #[default]
    RetainStale,
    /// Blank the tree
    Clear,
}

/// Tree presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Quiet period before a search query settles
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Folders at this depth or deeper start collapsed after each load
    #[serde(default = "default_collapse_depth")]
    pub collapse_depth: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Default number of entries for the recent list
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_collapse_depth() -> usize {
    crate::tree::DEFAULT_COLLAPSE_DEPTH
}

fn default_recent_count() -> usize {
    10
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
            collapse_depth: default_collapse_depth(),
            failure_policy: FailurePolicy::default(),
            recent_count: default_recent_count(),
        }
    }
}

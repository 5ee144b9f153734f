//! Built-in defaults, the lowest-precedence layer.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("store.backend", "chromium")?
        .set_default("store.mock_latency_ms", 100_i64)?
        .set_default("view.search_debounce_ms", 300_i64)?
        .set_default("view.collapse_depth", 2_i64)?
        .set_default("view.failure_policy", "retain_stale")?
        .set_default("view.recent_count", 10_i64)
}

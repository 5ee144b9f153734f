//! Platform locations: browser profile and tabmark's own config directory.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Project directories for tabmark (config, state)
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "tabmark", "tabmark")
}

/// Global config file: `<config dir>/config.toml`
pub fn global_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// `Bookmarks` file of the default Chrome profile on this platform
pub fn default_bookmarks_file() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    let profile = if cfg!(target_os = "macos") {
        base.data_dir().join("Google").join("Chrome")
    } else if cfg!(target_os = "windows") {
        base.data_local_dir()
            .join("Google")
            .join("Chrome")
            .join("User Data")
    } else {
        base.config_dir().join("google-chrome")
    };
    Some(profile.join("Default").join("Bookmarks"))
}

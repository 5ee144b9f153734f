//! CLI Tooling
//!
//! Command-line interface over the bookmark tree controller. Every command
//! builds a fresh controller against the configured store; `watch` keeps it
//! subscribed until interrupted.

use crate::config::{ConfigLoader, StoreBackend, StoreConfig, TabmarkConfig};
use crate::controller::{
    AssumeYes, BookmarkTreeController, ControllerContext, ControllerSettings, LoadOutcome, LoadPhase,
    OpenPath, RemovalConfirmer, RemovalOutcome, RemovalRequest, SystemOpener, UrlOpener,
};
use crate::error::{ApiError, StoreError};
use crate::store::{BookmarkStore, ChromiumStore, MemoryStore};
use crate::tooling::format::{
    format_notice, format_recent_json, format_recent_table, format_tree_json, format_tree_text,
};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Tabmark CLI - browse, search and edit browser bookmarks
#[derive(Parser)]
#[command(name = "tabmark")]
#[command(about = "Browse, search and edit browser bookmarks from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (replaces the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Chromium `Bookmarks` file to use
    #[arg(long)]
    pub bookmarks: Option<PathBuf>,

    /// Use the in-memory demo store
    #[arg(long, default_value = "false")]
    pub mock: bool,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Effective configuration: config files and env, then command-line flags
    pub fn resolve_config(&self) -> Result<TabmarkConfig, ApiError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(path) = &self.bookmarks {
            config.store.backend = StoreBackend::Chromium;
            config.store.bookmarks_file = Some(path.clone());
        }
        if self.mock {
            config.store.backend = StoreBackend::Memory;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the bookmark tree
    Tree {
        /// Filter by title or url
        #[arg(long)]
        query: Option<String>,
        /// Ignore the automatic collapse of deep folders
        #[arg(long)]
        expand_all: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Search bookmarks; matching folders are shown expanded
    Search {
        query: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the most recently added bookmarks
    Recent {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Remove a bookmark or folder
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Open a bookmark in the browser
    Open { id: String },
    /// Create a folder
    AddFolder {
        title: String,
        /// Parent folder id (default: bookmarks bar)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Create a bookmark
    AddBookmark {
        title: String,
        url: String,
        /// Parent folder id (default: bookmarks bar)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Re-render the tree on every change until Ctrl-C
    Watch {
        #[arg(long)]
        query: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

/// Asks on the terminal before removals
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirmer;

#[async_trait]
impl RemovalConfirmer for TerminalConfirmer {
    async fn confirm(&self, request: &RemovalRequest) -> bool {
        let prompt = request.prompt();
        let answer = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await;
        match answer {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to get user input; treating as declined");
                false
            }
            Err(e) => {
                warn!(error = %e, "Confirmation prompt aborted");
                false
            }
        }
    }
}

/// Build the store the configuration selects
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn BookmarkStore>, ApiError> {
    match config.backend {
        StoreBackend::Memory => {
            let store = match &config.mock_file {
                Some(path) => MemoryStore::from_file(path)?,
                None => MemoryStore::demo(),
            };
            debug!(latency_ms = config.mock_latency_ms, "Using in-memory store");
            Ok(Arc::new(
                store.with_latency(Duration::from_millis(config.mock_latency_ms)),
            ))
        }
        StoreBackend::Chromium => {
            let path = config.resolve_bookmarks_file()?;
            debug!(path = %path.display(), "Using Chromium bookmarks file");
            Ok(Arc::new(ChromiumStore::open(path)))
        }
    }
}

/// CLI context: configuration plus the collaborators every command shares
pub struct CliContext {
    config: TabmarkConfig,
    store: Arc<dyn BookmarkStore>,
    confirmer: Arc<dyn RemovalConfirmer>,
    opener: Arc<dyn UrlOpener>,
}

impl CliContext {
    pub fn new(config: TabmarkConfig) -> Result<Self, ApiError> {
        let store = build_store(&config.store)?;
        Ok(Self::with_store(
            config,
            store,
            Arc::new(TerminalConfirmer),
            Arc::new(SystemOpener),
        ))
    }

    pub fn with_store(
        config: TabmarkConfig,
        store: Arc<dyn BookmarkStore>,
        confirmer: Arc<dyn RemovalConfirmer>,
        opener: Arc<dyn UrlOpener>,
    ) -> Self {
        Self {
            config,
            store,
            confirmer,
            opener,
        }
    }

    pub fn config(&self) -> &TabmarkConfig {
        &self.config
    }

    fn controller(&self, confirmer: Arc<dyn RemovalConfirmer>) -> Arc<BookmarkTreeController> {
        let context = ControllerContext::new(confirmer, Arc::clone(&self.opener));
        Arc::new(BookmarkTreeController::new(
            Arc::clone(&self.store),
            context,
            ControllerSettings::from(&self.config.view),
        ))
    }

    /// Execute a one-shot command and return its output
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        if let Commands::Config = command {
            return self.config.to_toml();
        }
        if let Commands::Watch { query } = command {
            self.watch(query.as_deref(), |frame| println!("{}", frame)).await?;
            return Ok(String::new());
        }

        let confirmer: Arc<dyn RemovalConfirmer> = match command {
            Commands::Remove { yes: true, .. } => Arc::new(AssumeYes),
            _ => Arc::clone(&self.confirmer),
        };
        let controller = self.controller(confirmer);
        let outcome = controller.load().await;
        debug!(?outcome, "Initial load finished");

        let result = self.execute_inner(&controller, command, outcome).await;
        controller.dispose();
        result
    }

    async fn execute_inner(
        &self,
        controller: &BookmarkTreeController,
        command: &Commands,
        outcome: LoadOutcome,
    ) -> Result<String, ApiError> {
        match command {
            Commands::Tree {
                query,
                expand_all,
                format,
            } => {
                controller.set_query(query.as_deref().unwrap_or_default());
                if *expand_all {
                    controller.expand_all();
                }
                render_tree(controller, format)
            }
            Commands::Search { query, format } => {
                controller.set_query(query);
                controller.expand_all();
                render_tree(controller, format)
            }
            Commands::Recent { count, format } => {
                require_loaded(controller, outcome)?;
                let recent = controller.recent_bookmarks(*count);
                if format == "json" {
                    format_recent_json(&recent)
                } else {
                    Ok(format_recent_table(&recent))
                }
            }
            Commands::Remove { id, .. } => {
                require_loaded(controller, outcome)?;
                let node = controller
                    .find_node(id)
                    .ok_or_else(|| ApiError::Store(StoreError::NodeNotFound(id.clone())))?;
                match controller.remove_node(&node).await? {
                    RemovalOutcome::Removed => {
                        info!(node_id = %id, "Removed via CLI");
                        Ok(format!("Removed {} \"{}\"", node.kind(), node.title))
                    }
                    RemovalOutcome::Declined => Ok("Removal cancelled".to_string()),
                }
            }
            Commands::Open { id } => {
                require_loaded(controller, outcome)?;
                let node = controller
                    .find_node(id)
                    .ok_or_else(|| ApiError::Store(StoreError::NodeNotFound(id.clone())))?;
                let url = node
                    .url
                    .as_deref()
                    .ok_or_else(|| ApiError::OpenFailed(format!("\"{}\" is a folder", node.title)))?;
                let path = controller.open_node(url).await?;
                Ok(match path {
                    OpenPath::Store => format!("Opened {}", url),
                    OpenPath::Fallback => format!("Opened {} (system opener)", url),
                })
            }
            Commands::AddFolder { title, parent } => {
                let folder = controller.create_folder(title, parent.as_deref()).await?;
                Ok(format!("Created folder \"{}\" [{}]", folder.title, folder.id))
            }
            Commands::AddBookmark { title, url, parent } => {
                let bookmark = controller
                    .create_bookmark(title, url, parent.as_deref())
                    .await?;
                Ok(format!("Created bookmark \"{}\" [{}]", bookmark.title, bookmark.id))
            }
            Commands::Watch { .. } | Commands::Config => Ok(String::new()),
        }
    }

    /// Render on every applied change until Ctrl-C; `emit` receives each frame
    pub async fn watch<F>(&self, query: Option<&str>, mut emit: F) -> Result<(), ApiError>
    where
        F: FnMut(&str),
    {
        if let Err(e) = self.store.watch_external_changes() {
            warn!(error = %e, "External changes will not be picked up");
        }
        let controller = self.controller(Arc::clone(&self.confirmer));
        let mut revisions = controller.subscribe_revisions();
        let mut notices = controller.subscribe_notices();
        controller.set_query(query.unwrap_or_default());
        controller.start().await;

        let mut last_frame = String::new();
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        loop {
            if controller.phase() != LoadPhase::Loading {
                let frame = render_tree(&controller, "text")?;
                if frame != last_frame {
                    emit(&frame);
                    last_frame = frame;
                }
            }
            tokio::select! {
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                notice = notices.recv() => match notice {
                    Ok(notice) => emit(&format_notice(&notice)),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "Dropped notices"),
                    Err(RecvError::Closed) => break,
                },
                _ = &mut shutdown => {
                    info!("Interrupted; stopping watch");
                    break;
                }
            }
        }
        controller.dispose();
        Ok(())
    }
}

fn render_tree(controller: &BookmarkTreeController, format: &str) -> Result<String, ApiError> {
    let rows = controller.visible_rows();
    let state = controller.snapshot();
    let query = controller.query();
    if format == "json" {
        format_tree_json(&rows, &state, &query)
    } else {
        Ok(format_tree_text(&rows, &state, &query))
    }
}

/// Commands that act on specific nodes need a tree to act on
fn require_loaded(controller: &BookmarkTreeController, outcome: LoadOutcome) -> Result<(), ApiError> {
    match outcome {
        LoadOutcome::Applied => Ok(()),
        _ => {
            let message = controller
                .snapshot()
                .error
                .unwrap_or_else(|| "bookmark tree not loaded".to_string());
            Err(ApiError::Store(StoreError::Provider(message)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_context() -> (Arc<MemoryStore>, CliContext) {
        let store = Arc::new(MemoryStore::demo());
        let context = CliContext::with_store(
            TabmarkConfig::default(),
            store.clone(),
            Arc::new(AssumeYes),
            Arc::new(SystemOpener),
        );
        (store, context)
    }

    #[test]
    fn test_parse_tree_command() {
        let cli = Cli::parse_from(["tabmark", "--mock", "tree", "--query", "rust", "--expand-all"]);
        assert!(cli.mock);
        match cli.command {
            Commands::Tree {
                query,
                expand_all,
                format,
            } => {
                assert_eq!(query.as_deref(), Some("rust"));
                assert!(expand_all);
                assert_eq!(format, "text");
            }
            _ => panic!("expected tree command"),
        }
    }

    #[test]
    fn test_parse_add_bookmark() {
        let cli = Cli::parse_from(["tabmark", "add-bookmark", "Docs", "https://docs.rs", "--parent", "10"]);
        assert!(matches!(
            cli.command,
            Commands::AddBookmark { ref parent, .. } if parent.as_deref() == Some("10")
        ));
    }

    #[tokio::test]
    async fn test_search_expands_matches() {
        let (_store, context) = memory_context();
        let out = context
            .execute(&Commands::Search {
                query: "tokio".to_string(),
                format: "text".to_string(),
            })
            .await
            .unwrap();
        assert!(out.contains("Tokio"));
        assert!(!out.contains("Sourdough"));
    }

    #[tokio::test]
    async fn test_remove_protected_folder_fails() {
        let (store, context) = memory_context();
        let err = context
            .execute(&Commands::Remove {
                id: "1".to_string(),
                yes: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotRemovable { .. }));
        assert_eq!(store.remove_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_with_yes() {
        let (store, context) = memory_context();
        let out = context
            .execute(&Commands::Remove {
                id: "15".to_string(),
                yes: true,
            })
            .await
            .unwrap();
        assert_eq!(out, "Removed bookmark \"Hacker News\"");
        assert!(crate::tree::transform::find_by_id(&store.snapshot(), "15").is_none());
    }

    #[tokio::test]
    async fn test_open_uses_store_first() {
        let (store, context) = memory_context();
        let out = context
            .execute(&Commands::Open { id: "14".to_string() })
            .await
            .unwrap();
        assert_eq!(out, "Opened https://tokio.rs/");
        assert_eq!(store.opened_urls(), vec!["https://tokio.rs/".to_string()]);
    }

    #[tokio::test]
    async fn test_open_folder_is_an_error() {
        let (_store, context) = memory_context();
        let err = context
            .execute(&Commands::Open { id: "10".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OpenFailed(_)));
    }

    #[tokio::test]
    async fn test_recent_json() {
        let (_store, context) = memory_context();
        let out = context
            .execute(&Commands::Recent {
                count: Some(2),
                format: "json".to_string(),
            })
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["bookmarks"][0]["id"], "21");
    }

    #[tokio::test]
    async fn test_unavailable_store_reports_error() {
        let (store, context) = memory_context();
        store.set_available(false);
        let out = context
            .execute(&Commands::Tree {
                query: None,
                expand_all: false,
                format: "text".to_string(),
            })
            .await
            .unwrap();
        assert!(out.contains("unavailable"));
        let err = context
            .execute(&Commands::Recent {
                count: None,
                format: "text".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }
}

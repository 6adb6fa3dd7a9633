//! Shared application state

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use esd_discrepancy_core::{
    system_prompt, Classifier, DiscrepancyRegistry, ToolSet, TracingSink,
};

use crate::config::ServerConfig;
use crate::error::StartupError;
use crate::metrics::ApiMetrics;
use crate::services::{
    ChatStore, CompletionService, HttpCompletionClient, InMemoryChatStore, SessionProvider,
    StaticTokenSessions,
};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Runtime registration takes the write lock; lookups and tool calls read
    pub registry: Arc<RwLock<DiscrepancyRegistry>>,
    pub tools: Arc<ToolSet>,
    pub system_prompt: Arc<str>,
    pub classifier: Classifier,
    pub sessions: Arc<dyn SessionProvider>,
    pub chats: Arc<dyn ChatStore>,
    pub completion: Arc<dyn CompletionService>,
    pub metrics: Arc<ApiMetrics>,
    pub max_tool_rounds: u32,
    pub max_body_bytes: usize,
    pub start_time: Instant,
}

impl AppState {
    /// Assemble state around caller-supplied collaborators
    ///
    /// Loads the built-in tool cases (and field examples if requested),
    /// attaches the tracing and metrics sinks, and builds the tool set and
    /// system prompt from the tool cases.
    pub fn new(
        config: &ServerConfig,
        sessions: Arc<dyn SessionProvider>,
        chats: Arc<dyn ChatStore>,
        completion: Arc<dyn CompletionService>,
    ) -> Result<Self, StartupError> {
        let metrics = Arc::new(ApiMetrics::new()?);

        let mut registry = DiscrepancyRegistry::builtin(config.catalog.include_field_examples)?
            .with_sink(Arc::new(TracingSink))
            .with_sink(metrics.clone());

        for path in &config.catalog.extra_paths {
            let text = std::fs::read_to_string(path).map_err(|source| StartupError::Io {
                path: path.clone(),
                source,
            })?;
            let count = registry.load_catalog_str(&text)?;
            tracing::info!(path = %path.display(), count, "Loaded catalog file");
        }
        metrics.set_record_count(registry.len());

        let tools = ToolSet::builtin()?;
        let prompt = system_prompt(tools.records());

        Ok(Self {
            registry: Arc::new(RwLock::new(registry)),
            tools: Arc::new(tools),
            system_prompt: Arc::from(prompt),
            classifier: Classifier::new(config.classifier),
            sessions,
            chats,
            completion,
            metrics,
            max_tool_rounds: config.completion.max_tool_rounds,
            max_body_bytes: config.max_body_bytes,
            start_time: Instant::now(),
        })
    }

    /// State with the shipped collaborators: static tokens, in-memory chats
    /// and the HTTP completion client
    pub fn from_config(config: &ServerConfig) -> Result<Self, StartupError> {
        let sessions = Arc::new(StaticTokenSessions::new(config.auth.tokens.clone()));
        let chats = Arc::new(InMemoryChatStore::new());
        let completion = Arc::new(HttpCompletionClient::new(config.completion.clone())?);
        Self::new(config, sessions, chats, completion)
    }
}

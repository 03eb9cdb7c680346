//! Application state wiring the engine together.
//!
//! AppState loads `chorus.toml`, builds the provider registry through the
//! infra provider factory, attaches the remote memory backend when one is
//! configured, and hands everything to a [`ConversationEngine`].

use std::path::PathBuf;
use std::sync::Arc;

use chorus_core::agent::engine::ConversationEngine;
use chorus_core::agent::registry::AgentRegistry;
use chorus_core::chat::store::SessionContextStore;
use chorus_core::llm::factory::ProviderFactory;
use chorus_core::memory::box_backend::BoxMemoryBackend;
use chorus_core::memory::hybrid::HybridMemoryManager;
use chorus_core::memory::store::SemanticMemoryStore;
use chorus_infra::config::{default_data_dir, load_engine_config};
use chorus_infra::llm::create_provider;
use chorus_infra::memory::http::HttpMemoryBackend;
use chorus_types::agent::Agent;
use chorus_types::config::EngineConfig;

/// Persona registered when the config defines none.
pub fn fallback_agent() -> Agent {
    Agent::new(
        "assistant",
        "Assistant",
        "You are a helpful, concise assistant.",
    )
    .as_default()
}

/// Shared state for every command.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: EngineConfig,
    pub engine: Arc<ConversationEngine>,
}

impl AppState {
    /// Load configuration from `data_dir` (default `~/.chorus`) and wire the engine.
    pub async fn init(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let config = load_engine_config(&data_dir).await;
        let factory: Arc<dyn ProviderFactory> = Arc::new(create_provider);
        let engine = build_engine(&config, factory)?;

        Ok(Self {
            data_dir,
            config,
            engine: Arc::new(engine),
        })
    }
}

/// Build an engine for `config` with providers from `factory`.
pub fn build_engine(
    config: &EngineConfig,
    factory: Arc<dyn ProviderFactory>,
) -> anyhow::Result<ConversationEngine> {
    let mut registry = AgentRegistry::from_config(config, factory)?;
    if registry.is_empty() {
        registry.register(fallback_agent())?;
    }

    let store = match HttpMemoryBackend::from_config(&config.memory)? {
        Some(remote) => {
            tracing::info!("Using remote memory service with local fallback");
            SemanticMemoryStore::with_remote(BoxMemoryBackend::new(remote))
        }
        None => SemanticMemoryStore::new(),
    };
    let memory =
        HybridMemoryManager::new(Arc::new(store)).with_search_limit(config.memory.search_limit);

    let context = Arc::new(SessionContextStore::new(config.context.clone()));

    Ok(ConversationEngine::new(context, memory, Arc::new(registry)))
}

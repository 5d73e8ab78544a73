//! Subcommand implementations and the wiring they share.

pub mod config_cmd;
pub mod generate;
pub mod memory;
pub mod models;

use citewright_config::{AppConfig, ConfigError};
use citewright_core::event::Stage;
use citewright_core::memory::{Embedder, FactStore};
use citewright_core::provider::Provider;
use citewright_memory::{
    FactMemory, FileFactStore, HashEmbedder, InMemoryFactStore, ProviderEmbedder, QdrantFactStore,
};
use citewright_pipeline::{StageModel, StageModels};
use std::sync::Arc;
use std::time::Duration;

pub(crate) type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub(crate) fn load_config() -> CliResult<AppConfig> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// The configured chat provider.
pub(crate) fn build_provider(config: &AppConfig) -> CliResult<Arc<dyn Provider>> {
    Ok(citewright_providers::build_from_config(config)?)
}

/// Resolve every stage's model and temperature against the catalog.
pub(crate) fn stage_models(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    model_name: &str,
    temperature: f32,
) -> Result<StageModels, ConfigError> {
    let build = |stage: Stage| -> Result<StageModel, ConfigError> {
        let settings = config.stage_settings(stage, model_name, temperature)?;
        Ok(StageModel::new(provider.clone(), settings.model_id, settings.temperature)
            .with_max_tokens(config.default_max_tokens))
    };

    Ok(StageModels {
        research: build(Stage::Research)?,
        validation: build(Stage::Validation)?,
        writer: build(Stage::Writer)?,
        citation: build(Stage::Citation)?,
    })
}

/// Build the fact memory for the configured backend and embedder.
///
/// `provider` is only needed when embeddings come from the remote model.
pub(crate) fn build_memory(
    config: &AppConfig,
    provider: Option<Arc<dyn Provider>>,
) -> CliResult<FactMemory> {
    let mem = &config.memory;

    let embedder: Arc<dyn Embedder> = match mem.embedding_provider.as_str() {
        "provider" => {
            let provider = provider.ok_or("memory.embedding_provider = \"provider\" needs an API key")?;
            Arc::new(ProviderEmbedder::new(provider, &mem.embedding_model, mem.dimension))
        }
        _ => Arc::new(HashEmbedder::new(mem.dimension)),
    };

    let store: Arc<dyn FactStore> = match mem.backend.as_str() {
        "in_memory" => Arc::new(InMemoryFactStore::new()),
        "qdrant" => {
            let url = mem
                .qdrant_url
                .clone()
                .ok_or(ConfigError::MissingCredential {
                    name: "memory.qdrant_url",
                    env_var: "QDRANT_URL",
                })?;
            Arc::new(
                QdrantFactStore::new(url, &mem.collection, mem.dimension)
                    .with_api_key(mem.qdrant_api_key.clone())
                    .with_timeout(Duration::from_secs(mem.timeout_secs)),
            )
        }
        _ => Arc::new(FileFactStore::open(config.memory_path())),
    };

    Ok(FactMemory::new(store, embedder).with_top_k(mem.top_k))
}

/// Human-readable location of the configured store.
pub(crate) fn memory_location(config: &AppConfig) -> String {
    match config.memory.backend.as_str() {
        "in_memory" => "(process memory, not persisted)".into(),
        "qdrant" => format!(
            "{} / {}",
            config.memory.qdrant_url.as_deref().unwrap_or("(no url)"),
            config.memory.collection
        ),
        _ => config.memory_path().display().to_string(),
    }
}

/// Provider for remote embeddings, when the config asks for them.
pub(crate) fn embedding_provider(config: &AppConfig) -> CliResult<Option<Arc<dyn Provider>>> {
    if config.memory.embedding_provider == "provider" {
        Ok(Some(build_provider(config)?))
    } else {
        Ok(None)
    }
}

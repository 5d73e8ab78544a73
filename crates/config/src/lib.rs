//! Configuration loading, validation, and management for Citewright.
//!
//! Loads configuration from `~/.citewright/config.toml` with environment
//! variable overrides. Validates all settings at startup; credentials are
//! checked separately by [`AppConfig::require_credentials`] right before a
//! pipeline is built, so read-only commands work without keys.

use citewright_core::event::Stage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.citewright/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OpenRouter (or other OpenAI-compatible) API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Tavily web search API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tavily_api_key: Option<String>,

    /// Chat-completion endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Catalog name of the model used when none is selected
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature, `[0.0, 1.0]`
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// The selectable models
    #[serde(default = "default_catalog")]
    pub models: Vec<ModelEntry>,

    /// Per-stage model/temperature overrides
    #[serde(default)]
    pub stages: StagesConfig,

    /// Fact memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Encyclopedic lookup configuration
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Citation formatting configuration
    #[serde(default)]
    pub citation: CitationConfig,
}

fn default_model() -> String {
    "Mistral Small 3.1".into()
}
fn default_temperature() -> f32 {
    0.15
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_catalog() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            name: "Mistral Small 3.1".into(),
            id: "mistralai/mistral-small-3.1-24b-instruct:free".into(),
        },
        ModelEntry {
            name: "Gemma 3".into(),
            id: "google/gemma-3-27b-it:free".into(),
        },
    ]
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("tavily_api_key", &redact(&self.tavily_api_key))
            .field("provider", &self.provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("models", &self.models)
            .field("stages", &self.stages)
            .field("memory", &self.memory)
            .field("search", &self.search)
            .field("lookup", &self.lookup)
            .field("citation", &self.citation)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Overrides the well-known base URL for `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

fn default_provider_name() -> String {
    "openrouter".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: None,
        }
    }
}

/// One selectable model: display name → provider model id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub id: String,
}

/// Optional overrides for a single stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageOverride {
    /// Catalog model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagesConfig {
    #[serde(default)]
    pub research: StageOverride,
    #[serde(default)]
    pub validation: StageOverride,
    #[serde(default)]
    pub writer: StageOverride,
    #[serde(default)]
    pub citation: StageOverride,
}

impl StagesConfig {
    pub fn get(&self, stage: Stage) -> &StageOverride {
        match stage {
            Stage::Research => &self.research,
            Stage::Validation => &self.validation,
            Stage::Writer => &self.writer,
            Stage::Citation => &self.citation,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (Stage, &StageOverride)> {
        [Stage::Research, Stage::Validation, Stage::Writer, Stage::Citation]
            .into_iter()
            .map(move |s| (s, self.get(s)))
    }
}

/// Model id and temperature resolved for one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    pub model_id: String,
    pub temperature: f32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "file", "in_memory" or "qdrant"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// JSONL path for the file backend (default `~/.citewright/memory/facts.jsonl`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Facts retrieved per validation run
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// "hash" (offline) or "provider" (OpenAI-compatible embeddings endpoint)
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qdrant_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qdrant_api_key: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_memory_backend() -> String {
    "file".into()
}
fn default_collection() -> String {
    "blog-fact-validator".into()
}
fn default_dimension() -> usize {
    384
}
fn default_top_k() -> usize {
    5
}
fn default_embedding_provider() -> String {
    "hash".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_store_timeout() -> u64 {
    30
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
            collection: default_collection(),
            dimension: default_dimension(),
            top_k: default_top_k(),
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            qdrant_url: None,
            qdrant_api_key: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

impl std::fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .field("top_k", &self.top_k)
            .field("embedding_provider", &self.embedding_provider)
            .field("embedding_model", &self.embedding_model)
            .field("qdrant_url", &self.qdrant_url)
            .field("qdrant_api_key", &redact(&self.qdrant_api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// "basic" or "advanced"
    #[serde(default = "default_search_depth")]
    pub search_depth: String,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_max_results() -> usize {
    5
}
fn default_search_depth() -> String {
    "basic".into()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            search_depth: default_search_depth(),
            timeout_secs: default_store_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Wikipedia language edition
    #[serde(default = "default_language")]
    pub language: String,

    /// Pages summarised per lookup
    #[serde(default = "default_lookup_pages")]
    pub max_pages: usize,

    /// Character cap on the combined excerpt
    #[serde(default = "default_lookup_chars")]
    pub max_chars: usize,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_language() -> String {
    "en".into()
}
fn default_lookup_pages() -> usize {
    3
}
fn default_lookup_chars() -> usize {
    4000
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_pages: default_lookup_pages(),
            max_chars: default_lookup_chars(),
            timeout_secs: default_store_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationConfig {
    /// Hosts whose links are always described as "Unreliable source"
    #[serde(default = "default_low_authority")]
    pub low_authority_domains: Vec<String>,
}

fn default_low_authority() -> Vec<String> {
    ["blogspot.com", "medium.com", "wordpress.com", "tumblr.com", "quora.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            low_authority_domains: default_low_authority(),
        }
    }
}

/// Keys a pipeline run cannot start without.
pub struct Credentials {
    pub api_key: String,
    pub tavily_api_key: String,
}

impl AppConfig {
    /// Load configuration from the default path (~/.citewright/config.toml),
    /// then apply environment overrides:
    /// - `OPENROUTER_API_KEY` / `CITEWRIGHT_API_KEY`
    /// - `TAVILY_API_KEY`
    /// - `QDRANT_URL`, `QDRANT_API_KEY`
    /// - `CITEWRIGHT_MODEL`, `CITEWRIGHT_TEMPERATURE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup, then re-validate.
    pub fn apply_env(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = env("CITEWRIGHT_API_KEY").or_else(|| env("OPENROUTER_API_KEY"));
        }
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = env("TAVILY_API_KEY");
        }
        if let Some(url) = env("QDRANT_URL") {
            self.memory.qdrant_url = Some(url);
        }
        if let Some(key) = env("QDRANT_API_KEY") {
            self.memory.qdrant_api_key = Some(key);
        }
        if let Some(model) = env("CITEWRIGHT_MODEL") {
            self.default_model = model;
        }
        if let Some(raw) = env("CITEWRIGHT_TEMPERATURE") {
            self.default_temperature = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CITEWRIGHT_TEMPERATURE must be a number, got '{raw}'"
                ))
            })?;
        }
        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".citewright")
    }

    /// Where the file backend keeps facts unless `memory.path` says otherwise.
    pub fn memory_path(&self) -> PathBuf {
        self.memory
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("memory").join("facts.jsonl"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_temperature("default_temperature", self.default_temperature)?;

        if self.models.is_empty() {
            return Err(ConfigError::ValidationError(
                "the model catalog must list at least one model".into(),
            ));
        }
        self.resolve_model(&self.default_model)?;

        for (stage, over) in self.stages.iter() {
            if let Some(m) = &over.model {
                self.resolve_model(m)?;
            }
            if let Some(t) = over.temperature {
                check_temperature(&format!("stages.{stage}.temperature"), t)?;
            }
        }

        if !matches!(self.memory.backend.as_str(), "file" | "in_memory" | "qdrant") {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be one of file, in_memory, qdrant (got '{}')",
                self.memory.backend
            )));
        }

        if !matches!(self.memory.embedding_provider.as_str(), "hash" | "provider") {
            return Err(ConfigError::ValidationError(format!(
                "memory.embedding_provider must be hash or provider (got '{}')",
                self.memory.embedding_provider
            )));
        }

        if self.memory.dimension == 0 || self.memory.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "memory.dimension and memory.top_k must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Look a model up by catalog name (case-insensitive).
    pub fn resolve_model(&self, name: &str) -> Result<&ModelEntry, ConfigError> {
        self.models
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ConfigError::UnknownModel {
                name: name.to_string(),
                available: self.models.iter().map(|m| m.name.clone()).collect(),
            })
    }

    /// Resolve model id and temperature for one stage.
    ///
    /// A stage override wins over the run-level selection. Both must name a
    /// catalog model.
    pub fn stage_settings(
        &self,
        stage: Stage,
        model_name: &str,
        temperature: f32,
    ) -> Result<StageSettings, ConfigError> {
        check_temperature("temperature", temperature)?;
        let over = self.stages.get(stage);

        let model_id = match &over.model {
            Some(m) => self.resolve_model(m)?.id.clone(),
            None => self.resolve_model(model_name)?.id.clone(),
        };

        Ok(StageSettings {
            model_id,
            temperature: over.temperature.unwrap_or(temperature),
        })
    }

    /// Check that every credential a run needs is present.
    pub fn require_credentials(&self) -> Result<Credentials, ConfigError> {
        let api_key = non_empty(&self.api_key).ok_or(ConfigError::MissingCredential {
            name: "api_key",
            env_var: "OPENROUTER_API_KEY",
        })?;
        let tavily_api_key =
            non_empty(&self.tavily_api_key).ok_or(ConfigError::MissingCredential {
                name: "tavily_api_key",
                env_var: "TAVILY_API_KEY",
            })?;

        if self.memory.backend == "qdrant" && non_empty(&self.memory.qdrant_url).is_none() {
            return Err(ConfigError::MissingCredential {
                name: "memory.qdrant_url",
                env_var: "QDRANT_URL",
            });
        }

        Ok(Credentials {
            api_key,
            tavily_api_key,
        })
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            tavily_api_key: None,
            provider: ProviderConfig::default(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            models: default_catalog(),
            stages: StagesConfig::default(),
            memory: MemoryConfig::default(),
            search: SearchConfig::default(),
            lookup: LookupConfig::default(),
            citation: CitationConfig::default(),
        }
    }
}

fn check_temperature(field: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be between 0.0 and 1.0 (got {value})"
        )));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing credential '{name}' (set {env_var} or add it to config.toml)")]
    MissingCredential {
        name: &'static str,
        env_var: &'static str,
    },

    #[error("Unknown model '{name}'. Available: {}", available.join(", "))]
    UnknownModel { name: String, available: Vec<String> },
}

impl From<ConfigError> for citewright_core::Error {
    fn from(err: ConfigError) -> Self {
        citewright_core::Error::Config {
            message: err.to_string(),
        }
    }
}

//! Builds the configured LLM provider.

use std::sync::Arc;
use citewright_config::{AppConfig, ConfigError};
use citewright_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// Fails when no API key is configured; a keyless provider would only fail
/// later with an authentication error from the remote side.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingCredential {
            name: "api_key",
            env_var: "OPENROUTER_API_KEY",
        })?;

    let name = &config.provider.name;
    let base_url = config
        .provider
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(name));

    Ok(Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

//! `citewright config` — Configuration management commands.

use citewright_config::AppConfig;

use super::{CliResult, load_config};

pub async fn show() -> CliResult {
    let config = load_config()?;
    let toml_str = toml::to_string_pretty(&redacted(&config))?;
    println!("{toml_str}");
    Ok(())
}

pub async fn init(force: bool) -> CliResult {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() && !force {
        println!("⚠️  {} already exists.", path.display());
        println!("   Run with --force to overwrite it.");
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Wrote default configuration to {}", path.display());
    println!("   Set OPENROUTER_API_KEY and TAVILY_API_KEY before running `citewright generate`.");
    Ok(())
}

/// Copy of `config` with secrets masked.
fn redacted(config: &AppConfig) -> AppConfig {
    let mut out = config.clone();
    for secret in [
        &mut out.api_key,
        &mut out.tavily_api_key,
        &mut out.memory.qdrant_api_key,
    ] {
        if secret.is_some() {
            *secret = Some("***".into());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".citewright"));
    }

    #[test]
    fn secrets_masked_in_show_output() {
        let config = AppConfig {
            api_key: Some("sk-or-v1-secret".into()),
            tavily_api_key: Some("tvly-secret".into()),
            ..AppConfig::default()
        };

        let out = toml::to_string_pretty(&redacted(&config)).unwrap();
        assert!(!out.contains("secret"));
        assert!(out.contains("api_key = \"***\""));
        assert!(!out.contains("qdrant_api_key"));
    }

    #[test]
    fn default_toml_round_trips() {
        let parsed: AppConfig = toml::from_str(&AppConfig::default_toml()).unwrap();
        assert!(parsed.validate().is_ok());
    }
}

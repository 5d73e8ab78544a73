//! Citewright CLI — the main entry point.
//!
//! Commands:
//! - `generate` — Research, validate, write and cite an article
//! - `models`   — List the model catalog
//! - `memory`   — Inspect or reset the fact memory
//! - `config`   — Show or initialize configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "citewright",
    about = "Citewright — researched, fact-checked and cited blog articles",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a cited article for a topic
    Generate {
        /// Topic to write about
        topic: String,

        /// Model name from the catalog (see `citewright models`)
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature, 0.0 to 1.0
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Write the article here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write every intermediate stage output here as JSON
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// List available models
    Models,

    /// Fact memory management
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Show backend, location and fact count
    Stats,

    /// Search stored facts by similarity
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Delete every stored fact
    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            topic,
            model,
            temperature,
            output,
            artifacts,
        } => {
            let args = commands::generate::GenerateArgs {
                topic,
                model,
                temperature,
                output,
                artifacts,
            };
            commands::generate::run(args).await?
        }
        Commands::Models => commands::models::run().await?,
        Commands::Memory { action } => match action {
            MemoryAction::Stats => commands::memory::stats().await?,
            MemoryAction::Search { query, limit } => commands::memory::search(&query, limit).await?,
            MemoryAction::Reset { confirm } => commands::memory::reset(confirm).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "citewright",
            "generate",
            "solar eclipses",
            "--model",
            "Gemma 3",
            "--temperature",
            "0.4",
            "-o",
            "out.md",
            "--artifacts",
            "run.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                topic,
                model,
                temperature,
                output,
                artifacts,
            } => {
                assert_eq!(topic, "solar eclipses");
                assert_eq!(model.as_deref(), Some("Gemma 3"));
                assert_eq!(temperature, Some(0.4));
                assert_eq!(output, Some(PathBuf::from("out.md")));
                assert_eq!(artifacts, Some(PathBuf::from("run.json")));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_requires_topic() {
        assert!(Cli::try_parse_from(["citewright", "generate"]).is_err());
    }

    #[test]
    fn memory_reset_defaults_to_unconfirmed() {
        let cli = Cli::try_parse_from(["citewright", "memory", "reset"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Memory {
                action: MemoryAction::Reset { confirm: false }
            }
        ));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["citewright", "models", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}

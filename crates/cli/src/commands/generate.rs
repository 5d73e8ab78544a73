//! `citewright generate` — run the full pipeline for one topic.

use std::path::PathBuf;
use std::sync::Arc;

use citewright_config::{AppConfig, ConfigError};
use citewright_core::event::{EventBus, PipelineEvent};
use citewright_pipeline::{CitationPolicy, Pipeline, PipelineContext, PipelineRun};
use citewright_tools::{TavilySearch, WikipediaLookup};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::{CliResult, build_memory, build_provider, load_config, memory_location, stage_models};

pub struct GenerateArgs {
    pub topic: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub output: Option<PathBuf>,
    pub artifacts: Option<PathBuf>,
}

pub async fn run(args: GenerateArgs) -> CliResult {
    let config = load_config()?;

    let credentials = match config.require_credentials() {
        Ok(c) => c,
        Err(e) => {
            if let ConfigError::MissingCredential { env_var, .. } = &e {
                print_setup_help(env_var);
            }
            return Err(e.into());
        }
    };

    let model_name = args.model.unwrap_or_else(|| config.default_model.clone());
    let temperature = args.temperature.unwrap_or(config.default_temperature);

    let provider = build_provider(&config)?;
    let models = stage_models(&config, provider.clone(), &model_name, temperature)?;

    let search = TavilySearch::new(credentials.tavily_api_key)
        .with_search_depth(&config.search.search_depth)
        .with_max_results(config.search.max_results)
        .with_timeout(config.search.timeout_secs);
    let lookup = WikipediaLookup::new(&config.lookup.language)
        .with_max_pages(config.lookup.max_pages)
        .with_max_chars(config.lookup.max_chars)
        .with_timeout(config.lookup.timeout_secs);

    let memory = build_memory(&config, Some(provider))?;
    let events = Arc::new(EventBus::default());

    eprintln!();
    eprintln!("  Topic:   {}", args.topic.trim());
    eprintln!("  Model:   {model_name} (temperature {temperature})");
    eprintln!("  Memory:  {} at {}", config.memory.backend, memory_location(&config));
    eprintln!();

    let progress = tokio::spawn(print_progress(events.subscribe()));

    let pipeline = Pipeline::new(PipelineContext {
        models,
        search: Arc::new(search),
        lookup: Arc::new(lookup),
        memory: Arc::new(memory),
        citation: citation_policy(&config),
        events: events.clone(),
    });

    let result = pipeline.run(&args.topic).await;

    // Closing the bus ends the progress task on success or failure
    drop(pipeline);
    drop(events);
    let _ = progress.await;

    let run = result?;
    print_summary(&run);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &run.final_text)?;
            eprintln!("  Article written to {}", path.display());
        }
        None => println!("{}", run.final_text),
    }

    if let Some(path) = &args.artifacts {
        std::fs::write(path, serde_json::to_string_pretty(&run)?)?;
        eprintln!("  Artifacts written to {}", path.display());
    }

    Ok(())
}

fn citation_policy(config: &AppConfig) -> CitationPolicy {
    CitationPolicy {
        low_authority_domains: config.citation.low_authority_domains.clone(),
    }
}

async fn print_progress(rx: broadcast::Receiver<Arc<PipelineEvent>>) {
    forward_progress(rx, |line| eprintln!("{line}")).await;
}

/// Feed progress lines to `emit` until the bus closes. A lagging receiver
/// skips the dropped events and keeps going.
async fn forward_progress(mut rx: broadcast::Receiver<Arc<PipelineEvent>>, mut emit: impl FnMut(String)) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = progress_line(&event) {
                    emit(line);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress output lagged behind the pipeline");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn progress_line(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::StageStarted { stage, model, .. } => Some(format!("  → {stage} ({model})")),
        PipelineEvent::StageCompleted {
            stage,
            items,
            rejected_lines,
            duration_ms,
            ..
        } => {
            let rejected = if *rejected_lines > 0 {
                format!(", {rejected_lines} lines rejected")
            } else {
                String::new()
            };
            Some(format!("  ✓ {stage}: {items} items{rejected} in {duration_ms} ms"))
        }
        PipelineEvent::FactsStored { count, .. } => Some(format!("  ✓ memory: {count} facts stored")),
        _ => None,
    }
}

fn print_summary(run: &PipelineRun) {
    let low = run
        .validation
        .facts
        .iter()
        .filter(|f| f.is_low_confidence())
        .count();

    eprintln!();
    eprintln!("  Researched:  {} facts", run.research.facts.len());
    eprintln!("  Validated:   {} ({low} low confidence)", run.validation.facts.len());
    eprintln!("  Written:     {} facts used", run.draft.facts_used.len());
    eprintln!("  References:  {}", run.citation.references.len());
    if run.research.insufficient {
        eprintln!("  Note: research found no reliable information for this topic");
    }
    eprintln!();
}

fn print_setup_help(env_var: &str) {
    eprintln!();
    eprintln!("  ERROR: missing credential {env_var}");
    eprintln!();
    eprintln!("  Set it in the environment or a .env file:");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   https://openrouter.ai/keys");
    eprintln!("    TAVILY_API_KEY=tvly-...           https://tavily.com");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}

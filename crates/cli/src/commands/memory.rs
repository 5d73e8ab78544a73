//! `citewright memory` — Fact memory inspection and reset.

use super::{CliResult, build_memory, embedding_provider, load_config, memory_location};

pub async fn stats() -> CliResult {
    let config = load_config()?;
    let memory = build_memory(&config, embedding_provider(&config)?)?;

    println!("🧠 Fact Memory");
    println!("==============");
    println!("  Backend:    {}", config.memory.backend);
    println!("  Location:   {}", memory_location(&config));
    println!(
        "  Embeddings: {} ({} dims)",
        config.memory.embedding_provider, config.memory.dimension
    );
    println!("  Top-k:      {}", config.memory.top_k);

    match memory.count().await {
        Ok(n) => println!("  Facts:      {n}"),
        Err(e) => println!("  Facts:      unavailable ({e})"),
    }

    Ok(())
}

pub async fn search(query: &str, limit: usize) -> CliResult {
    let config = load_config()?;
    let memory = build_memory(&config, embedding_provider(&config)?)?;

    println!("🔍 Searching facts for: \"{query}\"");
    println!();

    let hits = memory.search(query, limit.max(1)).await;
    if hits.is_empty() {
        println!("   No facts found.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("  {:>2}. [score: {:.2}] {}", i + 1, hit.score, hit.payload.fact);
        let mut detail = Vec::new();
        if let Some(verdict) = hit.payload.verdict {
            detail.push(format!("verdict: {verdict}"));
        }
        if !hit.payload.source.is_empty() {
            detail.push(format!("source: {}", hit.payload.source));
        }
        if !detail.is_empty() {
            println!("      {}", detail.join(", "));
        }
    }

    Ok(())
}

pub async fn reset(confirm: bool) -> CliResult {
    if !confirm {
        println!("⚠️  This will delete ALL stored facts permanently.");
        println!("   Run with --confirm to proceed:");
        println!("   citewright memory reset --confirm");
        return Ok(());
    }

    let config = load_config()?;
    let memory = build_memory(&config, embedding_provider(&config)?)?;
    let before = memory.count().await.unwrap_or(0);

    memory.reset().await?;
    println!("🗑️  Deleted {before} facts from {}.", memory_location(&config));

    Ok(())
}

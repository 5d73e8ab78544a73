//! Validation stage: memory + encyclopedia + model verdicts.

use citewright_core::event::Stage;
use citewright_core::fact::{Fact, ValidatedFact, Verdict};
use citewright_core::memory::FactPayload;
use citewright_core::tool::KnowledgeLookup;
use citewright_memory::FactMemory;
use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::info;

use crate::model::StageModel;
use crate::parse::{LineOutcome, ParseReport, is_bullet, parse_lines};
use crate::prompts;
use crate::research::ResearchOutput;

/// `- "<statement>" — <verdict> — <reason> [— Correction: "<text>"]`
///
/// Em or en dashes, straight or curly quotes, optional bold verdict.
static VERDICT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^[-*]\s+["“](.+?)["”]\s+[—–]\s+\**(True|False|Uncertain)\**\s+[—–]\s+(.+?)(?:\s+[—–]\s+\**Correction:?\**\s*["“]?(.+?)(?:["”][.,;]*)?)?\s*$"#,
    )
    .expect("verdict pattern is valid")
});

#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutput {
    /// Validated facts in model output order
    pub facts: Vec<ValidatedFact>,
    pub raw_text: String,
    pub report: ParseReport,
    /// Memory facts shown to the validator
    pub memory_hits: Vec<FactPayload>,
}

fn classify(line: &str, candidates: &[Fact]) -> LineOutcome<ValidatedFact> {
    if !is_bullet(line) {
        return LineOutcome::Ignored;
    }
    let Some(caps) = VERDICT_LINE.captures(line) else {
        return LineOutcome::Rejected("not a `\"statement\" — verdict — reason` line".into());
    };

    let statement = caps[1].trim();
    let Some(verdict) = Verdict::parse(&caps[2]) else {
        return LineOutcome::Rejected(format!("unknown verdict '{}'", &caps[2]));
    };
    let reason = caps[3].trim();
    let correction = caps.get(4).map(|m| m.as_str().trim().to_string());
    let source = match_source(statement, candidates);

    LineOutcome::Parsed(ValidatedFact::new(statement, verdict, reason, correction, source))
}

/// Lowercase alphanumeric tokens.
fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shortest token run that may match by containment.
const MIN_CONTAINED_TOKENS: usize = 3;

/// Whether `inner` occurs as a contiguous run of whole tokens in `outer`.
fn contains_run(outer: &[String], inner: &[String]) -> bool {
    inner.len() >= MIN_CONTAINED_TOKENS
        && inner.len() <= outer.len()
        && outer.windows(inner.len()).any(|w| w == inner)
}

/// Source URL of the research fact the validator quoted.
///
/// Exact token match wins, then a run of at least three whole tokens
/// contained either way. Empty when nothing matches.
pub fn match_source(statement: &str, candidates: &[Fact]) -> String {
    let needle = tokens(statement);
    if needle.is_empty() {
        return String::new();
    }

    let tokenized: Vec<(Vec<String>, &Fact)> =
        candidates.iter().map(|f| (tokens(&f.text), f)).collect();

    tokenized
        .iter()
        .find(|(text, _)| *text == needle)
        .or_else(|| {
            tokenized
                .iter()
                .find(|(text, _)| contains_run(text, &needle) || contains_run(&needle, text))
        })
        .map(|(_, f)| f.source.clone())
        .unwrap_or_default()
}

/// Parse a validator reply; `candidates` supply citation URLs.
pub fn parse_validation(text: &str, candidates: &[Fact]) -> (Vec<ValidatedFact>, ParseReport) {
    parse_lines(Stage::Validation, text, |line| classify(line, candidates))
}

/// One memory bullet; a known verdict is shown so rejected facts read as such.
fn memory_line(payload: &FactPayload) -> String {
    match payload.verdict {
        Some(verdict) => format!("- {} (previously: {verdict})", payload.fact),
        None => format!("- {}", payload.fact),
    }
}

fn memory_block(facts: &[FactPayload]) -> String {
    if facts.is_empty() {
        prompts::NO_MEMORY.to_string()
    } else {
        facts.iter().map(memory_line).collect::<Vec<_>>().join("\n")
    }
}

pub async fn validate(
    topic: &str,
    research: &ResearchOutput,
    memory: &FactMemory,
    lookup: &dyn KnowledgeLookup,
    model: &StageModel,
) -> citewright_core::Result<ValidationOutput> {
    let memory_hits = memory.retrieve_facts(topic).await;
    let excerpt = lookup.lookup(topic).await?;
    info!(
        memory_hits = memory_hits.len(),
        tool = lookup.name(),
        excerpt_chars = excerpt.len(),
        "Validation context gathered"
    );

    let prompt = prompts::validation(&memory_block(&memory_hits), &excerpt, &research.raw_text);
    let reply = model.complete(&prompt).await?;
    let (facts, report) = parse_validation(&reply, &research.facts);

    info!(
        validated = facts.len(),
        rejected = report.rejected_count(),
        low_confidence = facts.iter().filter(|f| f.is_low_confidence()).count(),
        "Validation parsed"
    );

    Ok(ValidationOutput {
        facts,
        raw_text: reply,
        report,
        memory_hits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::parse_research;
    use crate::test_helpers::{MockLookup, SequentialMockProvider, memory_with};
    use citewright_core::fact::Confidence;
    use std::sync::Arc;

    fn candidates() -> Vec<Fact> {
        vec![
            Fact::new("The Eiffel Tower is in Berlin.", "https://travel.example.com/eiffel"),
            Fact::new("Solar eclipses happen at new moon", "https://science.nasa.gov/eclipses/"),
        ]
    }

    #[test]
    fn correction_replaces_statement() {
        let line = r#"- "The Eiffel Tower is in Berlin." — False — The encyclopedia says it's in Paris — Correction: "The Eiffel Tower is in Paris.""#;
        let (facts, report) = parse_validation(line, &candidates());
        assert!(report.is_clean());
        let f = &facts[0];
        assert_eq!(f.fact, "The Eiffel Tower is in Paris.");
        assert_eq!(f.statement, "The Eiffel Tower is in Berlin.");
        assert_eq!(f.verdict, Verdict::False);
        assert_eq!(f.reason, "The encyclopedia says it's in Paris");
        assert_eq!(f.source, "https://travel.example.com/eiffel");
        assert_eq!(f.confidence, Some(Confidence::Medium));
        assert_eq!(f.verdict_note(), "False - The encyclopedia says it's in Paris");
    }

    #[test]
    fn punctuation_after_correction_quote_is_dropped() {
        let line = r#"- "The Eiffel Tower is in Berlin." — False — It is in Paris — Correction: "The Eiffel Tower is in Paris."."#;
        let (facts, report) = parse_validation(line, &candidates());
        assert!(report.is_clean());
        assert_eq!(facts[0].fact, "The Eiffel Tower is in Paris.");

        let unquoted = "- \"The Eiffel Tower is in Berlin.\" — False — It is in Paris — Correction: It is in Paris.";
        let (facts, _) = parse_validation(unquoted, &candidates());
        assert_eq!(facts[0].fact, "It is in Paris.");
    }

    #[test]
    fn uncertain_without_correction_keeps_statement() {
        let line = "- \"Solar eclipses happen at new moon.\" — Uncertain — Not covered by the excerpt";
        let (facts, _) = parse_validation(line, &candidates());
        assert_eq!(facts[0].fact, "Solar eclipses happen at new moon.");
        assert!(facts[0].correction.is_none());
        assert_eq!(facts[0].source, "https://science.nasa.gov/eclipses/");
        assert_eq!(facts[0].confidence, Some(Confidence::Medium));
    }

    #[test]
    fn false_without_correction_is_low_confidence() {
        let line = "- “Totality lasts an hour.” – **False** – Totality lasts minutes";
        let (facts, report) = parse_validation(line, &candidates());
        assert!(report.is_clean());
        assert_eq!(facts[0].fact, "Totality lasts an hour.");
        assert_eq!(facts[0].verdict, Verdict::False);
        assert!(facts[0].is_low_confidence());
        assert_eq!(facts[0].source, "");
    }

    #[test]
    fn malformed_lines_dropped_and_counted() {
        let text = "Here is my review:\n\
                    - \"A\" — True — fine\n\
                    - \"B\" — Maybe — unsure\n\
                    - C is true\n\
                    - \"D\" — True — ok";
        let (facts, report) = parse_validation(text, &[]);
        let order: Vec<_> = facts.iter().map(|f| f.fact.as_str()).collect();
        assert_eq!(order, vec!["A", "D"]);
        assert_eq!(report.rejected_count(), 2);
        assert_eq!(report.ignored, 1);
    }

    #[test]
    fn source_matching_prefers_exact_then_containment() {
        let facts = vec![
            Fact::new("Eclipses happen at new moon and last minutes", "https://long.org"),
            Fact::new("Eclipses happen at new moon", "https://exact.org"),
        ];
        assert_eq!(match_source("Eclipses happen at NEW moon!", &facts), "https://exact.org");
        assert_eq!(match_source("at new moon and last", &facts), "https://long.org");
        assert_eq!(match_source("Unrelated", &facts), "");
        assert_eq!(match_source("...", &facts), "");
    }

    #[test]
    fn source_matching_needs_whole_tokens() {
        let facts = vec![Fact::new("Sunday markets open early in Lyon", "https://markets.example/lyon")];
        assert_eq!(match_source("Sun", &facts), "");
        assert_eq!(match_source("Sunday markets", &facts), "");
        assert_eq!(match_source("day markets open early", &facts), "");
        assert_eq!(
            match_source("Sunday markets open early", &facts),
            "https://markets.example/lyon"
        );
        assert_eq!(
            match_source("In fact, Sunday markets open early in Lyon every week.", &facts),
            "https://markets.example/lyon"
        );
    }

    #[test]
    fn memory_block_uses_sentinel_when_empty() {
        assert_eq!(memory_block(&[]), prompts::NO_MEMORY);
        let plain = |fact: &str| FactPayload {
            fact: fact.into(),
            source: String::new(),
            verdict: None,
        };
        assert_eq!(memory_block(&[plain("a"), plain("b")]), "- a\n- b");
    }

    #[test]
    fn memory_block_shows_stored_verdicts() {
        let rejected = FactPayload {
            fact: "Totality lasts an hour.".into(),
            source: String::new(),
            verdict: Some(Verdict::False),
        };
        let confirmed = FactPayload {
            fact: "Totality lasts minutes.".into(),
            source: "https://nasa.gov".into(),
            verdict: Some(Verdict::True),
        };
        assert_eq!(
            memory_block(&[rejected, confirmed]),
            "- Totality lasts an hour. (previously: False)\n- Totality lasts minutes. (previously: True)"
        );
    }

    #[tokio::test]
    async fn validate_builds_prompt_from_memory_lookup_and_draft() {
        let research = parse_research("- Eclipses happen at new moon [Source](https://nasa.gov)");
        let memory = memory_with(&["Eclipses happen at new moon."]).await;
        let lookup = MockLookup::new("Page: Solar eclipse\nSummary: ...");
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "- \"Eclipses happen at new moon\" — True — Memory confirms it",
        ]));
        let model = StageModel::new(provider.clone(), "m", 0.15);

        let out = validate("eclipses new moon", &research, &memory, &lookup, &model)
            .await
            .unwrap();

        assert_eq!(out.facts.len(), 1);
        assert_eq!(out.facts[0].source, "https://nasa.gov");
        assert_eq!(out.memory_hits.len(), 1);
        assert_eq!(out.memory_hits[0].fact, "Eclipses happen at new moon.");

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("- Eclipses happen at new moon."));
        assert!(prompt.contains("Page: Solar eclipse"));
        assert!(prompt.contains("[Source](https://nasa.gov)"));
    }

    #[tokio::test]
    async fn previously_rejected_fact_is_flagged_in_prompt() {
        let research = parse_research("- Totality lasts an hour [Source](https://blog.example.com)");
        let memory = memory_with(&[]).await;
        let rejected = ValidatedFact::new(
            "Totality lasts an hour.",
            Verdict::False,
            "Totality lasts minutes",
            None,
            "",
        );
        assert!(memory.store_validated(&rejected).await);
        let lookup = MockLookup::new("Page: Solar eclipse");
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "- \"Totality lasts an hour\" — False — Memory rejected it",
        ]));
        let model = StageModel::new(provider.clone(), "m", 0.15);

        let out = validate("totality lasts", &research, &memory, &lookup, &model)
            .await
            .unwrap();

        assert_eq!(out.memory_hits[0].verdict, Some(Verdict::False));
        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("FACTUAL MEMORY:\n- Totality lasts an hour. (previously: False)\n"));
    }

    #[tokio::test]
    async fn empty_memory_uses_sentinel() {
        let research = parse_research("");
        let memory = memory_with(&[]).await;
        let lookup = MockLookup::new("excerpt");
        let provider = Arc::new(SequentialMockProvider::texts(&["no verdicts"]));
        let model = StageModel::new(provider.clone(), "m", 0.15);

        let out = validate("t", &research, &memory, &lookup, &model).await.unwrap();
        assert!(out.facts.is_empty());
        assert!(provider.requests()[0].messages[0].content.contains(prompts::NO_MEMORY));
    }

    #[tokio::test]
    async fn lookup_failure_aborts() {
        let research = parse_research("");
        let memory = memory_with(&[]).await;
        let lookup = MockLookup::failing();
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let model = StageModel::new(provider.clone(), "m", 0.15);

        assert!(validate("t", &research, &memory, &lookup, &model).await.is_err());
        assert_eq!(provider.call_count(), 0);
    }
}

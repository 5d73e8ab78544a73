//! Research stage: one web search, one model call, bullet parsing.

use citewright_core::event::Stage;
use citewright_core::fact::Fact;
use citewright_core::tool::WebSearch;
use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::info;

use crate::model::StageModel;
use crate::parse::{LineOutcome, ParseReport, is_bullet, parse_lines};
use crate::prompts;

/// `- <claim> [Source](<url>)` with optional trailing punctuation.
static FACT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*]\s+(.+?)\s*\[Source\]\(([^)\s]+)\)[.,;\s]*$").expect("fact pattern is valid")
});

#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutput {
    pub facts: Vec<Fact>,
    /// The model reply, fed verbatim to validation as the draft
    pub raw_text: String,
    pub report: ParseReport,
    /// The model said it found nothing reliable
    pub insufficient: bool,
}

fn classify(line: &str) -> LineOutcome<Fact> {
    if line.is_empty() || line.starts_with('#') || !is_bullet(line) {
        return LineOutcome::Ignored;
    }
    match FACT_LINE.captures(line) {
        Some(caps) => LineOutcome::Parsed(Fact::new(caps[1].trim(), &caps[2])),
        None => LineOutcome::Rejected("bullet without a [Source](url) citation".into()),
    }
}

/// Parse a research reply into cited facts.
pub fn parse_research(text: &str) -> ResearchOutput {
    let (facts, report) = parse_lines(Stage::Research, text, classify);
    let insufficient = facts.is_empty()
        && text
            .to_lowercase()
            .contains("insufficient reliable information");

    ResearchOutput {
        facts,
        raw_text: text.to_string(),
        report,
        insufficient,
    }
}

pub async fn research(
    topic: &str,
    search: &dyn WebSearch,
    model: &StageModel,
) -> citewright_core::Result<ResearchOutput> {
    let results = search.search(topic).await?;
    info!(tool = search.name(), chars = results.len(), "Web search complete");

    let reply = model.complete(&prompts::research(topic, &results)).await?;
    let output = parse_research(&reply);

    info!(
        facts = output.facts.len(),
        rejected = output.report.rejected_count(),
        insufficient = output.insufficient,
        "Research parsed"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockSearch, SequentialMockProvider};
    use std::sync::Arc;

    const REPLY: &str = "## Basics
- A solar eclipse happens when the Moon passes between the Sun and Earth. [Source](https://science.nasa.gov/eclipses/)
- Totality can last up to about 7.5 minutes [Source](https://en.wikipedia.org/wiki/Solar_eclipse).
* Eclipses only occur at new moon [Source](https://www.timeanddate.com/eclipse/)

## Unsourced
- The next eclipse will be spectacular.
Some closing prose.";

    #[test]
    fn parses_cited_bullets_only() {
        let out = parse_research(REPLY);
        assert_eq!(out.facts.len(), 3);
        assert_eq!(
            out.facts[0],
            Fact::new(
                "A solar eclipse happens when the Moon passes between the Sun and Earth.",
                "https://science.nasa.gov/eclipses/"
            )
        );
        assert_eq!(out.facts[1].source, "https://en.wikipedia.org/wiki/Solar_eclipse");
        assert_eq!(out.facts[2].text, "Eclipses only occur at new moon");
        assert!(out.facts.iter().all(|f| f.confidence.is_none()));
    }

    #[test]
    fn uncited_bullet_rejected_prose_ignored() {
        let out = parse_research(REPLY);
        assert_eq!(out.report.rejected_count(), 1);
        assert!(out.report.rejected[0].line.contains("spectacular"));
        // two headings, one blank, one prose line
        assert_eq!(out.report.ignored, 4);
        assert!(!out.insufficient);
    }

    #[test]
    fn zero_valid_lines_is_empty_not_error() {
        let out = parse_research("Nothing useful here.\n- no link at all");
        assert!(out.facts.is_empty());
        assert!(!out.insufficient);
    }

    #[test]
    fn insufficient_reply_flagged() {
        let out = parse_research("“Insufficient reliable information available.”");
        assert!(out.facts.is_empty());
        assert!(out.insufficient);
    }

    #[tokio::test]
    async fn research_searches_once_and_embeds_results() {
        let search = MockSearch::new("NASA eclipse page\nhttps://science.nasa.gov/eclipses/\n...");
        let provider = Arc::new(SequentialMockProvider::texts(&[REPLY]));
        let model = StageModel::new(provider.clone(), "m", 0.15);

        let out = research("solar eclipses", &search, &model).await.unwrap();
        assert_eq!(out.facts.len(), 3);
        assert_eq!(search.calls(), vec!["solar eclipses".to_string()]);

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("TOPIC: solar eclipses"));
        assert!(prompt.contains("https://science.nasa.gov/eclipses/"));
    }

    #[tokio::test]
    async fn search_failure_aborts() {
        let search = MockSearch::failing();
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let model = StageModel::new(provider.clone(), "m", 0.15);

        let err = research("x", &search, &model).await.unwrap_err();
        assert!(matches!(err, citewright_core::Error::Tool(_)));
        assert_eq!(provider.call_count(), 0);
    }
}

//! Writer stage: validated facts to a cited article draft.

use citewright_core::fact::{Confidence, Fact, ValidatedFact};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

use crate::model::StageModel;
use crate::prompts;

#[derive(Debug, Clone, Serialize)]
pub struct WriterOutput {
    /// Model article followed by the appended references list
    pub article: String,
    /// Facts handed to the model
    pub facts_used: Vec<Fact>,
}

/// Every fact whose confidence is not exactly Low.
pub fn select_facts(facts: &[ValidatedFact]) -> Vec<Fact> {
    facts
        .iter()
        .filter(|f| f.confidence != Some(Confidence::Low))
        .map(ValidatedFact::to_fact)
        .collect()
}

/// One bullet per fact, cited when a source is known.
pub fn facts_markdown(facts: &[Fact]) -> String {
    facts
        .iter()
        .map(|f| {
            if f.source.is_empty() {
                format!("- {}", f.text)
            } else {
                format!("- {} [Source]({})", f.text, f.source)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `\n\n## References\n` plus the sorted, unique, non-empty sources.
pub fn references_appendix(facts: &[Fact]) -> String {
    let sources: BTreeSet<&str> = facts
        .iter()
        .map(|f| f.source.as_str())
        .filter(|s| !s.is_empty())
        .collect();

    let lines: Vec<String> = sources.iter().map(|s| format!("- {s}")).collect();
    format!("\n\n## References\n{}", lines.join("\n"))
}

pub async fn write(
    topic: &str,
    facts: &[ValidatedFact],
    model: &StageModel,
) -> citewright_core::Result<WriterOutput> {
    let facts_used = select_facts(facts);
    info!(
        kept = facts_used.len(),
        dropped = facts.len() - facts_used.len(),
        "Writing article"
    );

    let mut article = model
        .complete(&prompts::article(topic, &facts_markdown(&facts_used)))
        .await?;
    article.push_str(&references_appendix(&facts_used));

    Ok(WriterOutput { article, facts_used })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use citewright_core::fact::Verdict;
    use std::sync::Arc;

    fn vf(text: &str, verdict: Verdict, correction: Option<&str>, source: &str) -> ValidatedFact {
        ValidatedFact::new(text, verdict, "reason", correction.map(String::from), source)
    }

    #[test]
    fn low_confidence_excluded_missing_confidence_included() {
        let mut unknown = vf("Unrated claim", Verdict::Uncertain, None, "https://c.org");
        unknown.confidence = None;
        let facts = vec![
            vf("Kept", Verdict::True, None, "https://a.org"),
            vf("Wrong", Verdict::False, None, "https://low.org"),
            vf("Wrong too", Verdict::False, Some("Fixed"), "https://b.org"),
            unknown,
        ];

        let used = select_facts(&facts);
        let texts: Vec<_> = used.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["Kept", "Fixed", "Unrated claim"]);

        let appendix = references_appendix(&used);
        assert!(!appendix.contains("low.org"));
        assert!(appendix.contains("- https://c.org"));
    }

    #[test]
    fn facts_markdown_cites_or_not() {
        let md = facts_markdown(&[Fact::new("A", "https://a.org"), Fact::new("B", "")]);
        assert_eq!(md, "- A [Source](https://a.org)\n- B");
    }

    #[test]
    fn appendix_sorted_unique_non_empty() {
        let facts = vec![
            Fact::new("1", "https://z.org"),
            Fact::new("2", "https://a.org"),
            Fact::new("3", "https://z.org"),
            Fact::new("4", ""),
        ];
        assert_eq!(
            references_appendix(&facts),
            "\n\n## References\n- https://a.org\n- https://z.org"
        );
    }

    #[test]
    fn appendix_with_no_sources() {
        assert_eq!(references_appendix(&[]), "\n\n## References\n");
    }

    #[tokio::test]
    async fn write_appends_references_unconditionally() {
        let provider = Arc::new(SequentialMockProvider::texts(&["# Eclipses\nBody [Source](https://a.org)"]));
        let model = StageModel::new(provider.clone(), "m", 0.15);
        let facts = vec![vf("Body", Verdict::True, None, "https://a.org")];

        let out = write("eclipses", &facts, &model).await.unwrap();
        assert_eq!(
            out.article,
            "# Eclipses\nBody [Source](https://a.org)\n\n## References\n- https://a.org"
        );
        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("- Body [Source](https://a.org)"));
        assert!(prompt.contains("Topic: eclipses"));
    }

    #[tokio::test]
    async fn zero_facts_still_writes() {
        let provider = Arc::new(SequentialMockProvider::texts(&["Short note."]));
        let model = StageModel::new(provider, "m", 0.15);
        let out = write("t", &[], &model).await.unwrap();
        assert!(out.facts_used.is_empty());
        assert!(out.article.starts_with("Short note."));
    }
}

//! Citation stage: renumber inline links and rebuild the references list.

use citewright_core::event::Stage;
use citewright_core::fact::Reference;
use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::model::StageModel;
use crate::parse::ParseReport;
use crate::prompts;
use crate::references;

pub const UNRELIABLE: &str = "Unreliable source";

/// Line-start `## References` heading.
static REFERENCES_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^##[ \t]+references\b").expect("heading pattern is valid")
});

/// Leading `1.`, `1)`, `-` or `*` list marker.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+[.)]|[-*])\s+").expect("marker pattern is valid")
});

/// Hosts whose links are always described as unreliable.
#[derive(Debug, Clone)]
pub struct CitationPolicy {
    pub low_authority_domains: Vec<String>,
}

impl Default for CitationPolicy {
    fn default() -> Self {
        Self {
            low_authority_domains: ["blogspot.com", "medium.com", "wordpress.com", "tumblr.com", "quora.com"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl CitationPolicy {
    /// True when the URL host is a listed domain or a subdomain of one.
    pub fn is_low_authority(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        self.low_authority_domains.iter().any(|d| {
            let d = d.trim().trim_start_matches('.').to_ascii_lowercase();
            !d.is_empty() && (host == d || host.ends_with(&format!(".{d}")))
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CitationOutput {
    pub text: String,
    pub references: Vec<Reference>,
    /// One description per reference, same order
    pub descriptions: Vec<String>,
    pub report: ParseReport,
}

/// Non-blank reply lines with list markers removed.
pub fn parse_descriptions(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| LIST_MARKER.replace(l, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Pair descriptions with references by index.
///
/// Missing slots get a placeholder naming the URL; surplus lines are
/// dropped. Both are recorded in the report. Low-authority hosts are
/// always labelled unreliable.
pub fn pair_descriptions(
    refs: &[Reference],
    lines: Vec<String>,
    policy: &CitationPolicy,
) -> (Vec<String>, ParseReport) {
    let mut report = ParseReport::default();
    let mut lines = lines.into_iter();

    let descriptions = refs
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let line = lines.next();
            match &line {
                Some(_) => report.parsed += 1,
                None => report.reject(Stage::Citation, i + 1, "", format!("no description for {}", r.url)),
            }
            if policy.is_low_authority(&r.url) {
                UNRELIABLE.to_string()
            } else {
                line.unwrap_or_else(|| format!("Source unavailable ({})", r.url))
            }
        })
        .collect();

    for (offset, extra) in lines.enumerate() {
        report.reject(
            Stage::Citation,
            refs.len() + offset + 1,
            &extra,
            "more descriptions than references",
        );
    }

    (descriptions, report)
}

/// Everything before the first line-start `## References` heading.
pub fn strip_references_section(text: &str) -> &str {
    match REFERENCES_HEADING.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

fn assemble(body: &str, descriptions: &[String]) -> String {
    let list: Vec<String> = descriptions
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}. {d}", i + 1))
        .collect();
    format!("{}\n\n## References\n{}", body.trim(), list.join("\n"))
}

pub async fn cite(
    article: &str,
    model: &StageModel,
    policy: &CitationPolicy,
) -> citewright_core::Result<CitationOutput> {
    let refs = references::extract(article);
    if refs.is_empty() {
        info!("No inline links, leaving article unchanged");
        return Ok(CitationOutput {
            text: article.to_string(),
            references: refs,
            descriptions: Vec::new(),
            report: ParseReport::default(),
        });
    }

    let numbered = references::renumber(article, &refs);
    let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
    let reply = model.complete(&prompts::citation(&urls)).await?;

    let lines = parse_descriptions(&reply);
    let (descriptions, report) = pair_descriptions(&refs, lines, policy);
    if !report.is_clean() {
        warn!(
            references = refs.len(),
            rejected = report.rejected_count(),
            "Citation descriptions did not line up with references"
        );
    }

    let text = assemble(strip_references_section(&numbered), &descriptions);
    info!(references = refs.len(), "Citations formatted");

    Ok(CitationOutput {
        text,
        references: refs,
        descriptions,
        report,
    })
}

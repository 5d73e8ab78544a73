//! Line-oriented parsing of model output.
//!
//! Every stage that reads model text classifies each line as parsed,
//! ignored (headings, blanks, prose) or rejected (looks like a record but
//! does not match the grammar). Rejections are never fatal.

use citewright_core::event::Stage;
use serde::Serialize;
use tracing::debug;

/// Why one line of model output was not accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseFailure {
    /// 1-based line number in the model output
    pub line_no: usize,
    pub line: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome<T> {
    Parsed(T),
    Ignored,
    Rejected(String),
}

/// Per-stage parse statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    pub parsed: usize,
    pub ignored: usize,
    pub rejected: Vec<ParseFailure>,
}

impl ParseReport {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn reject(&mut self, stage: Stage, line_no: usize, line: &str, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(%stage, line_no, line, reason = %reason, "Rejected model output line");
        self.rejected.push(ParseFailure {
            line_no,
            line: line.to_string(),
            reason,
        });
    }
}

/// Run `classify` over every line of `text`.
pub fn parse_lines<T>(
    stage: Stage,
    text: &str,
    mut classify: impl FnMut(&str) -> LineOutcome<T>,
) -> (Vec<T>, ParseReport) {
    let mut items = Vec::new();
    let mut report = ParseReport::default();

    for (idx, raw) in text.lines().enumerate() {
        match classify(raw.trim()) {
            LineOutcome::Parsed(item) => {
                report.parsed += 1;
                items.push(item);
            }
            LineOutcome::Ignored => report.ignored += 1,
            LineOutcome::Rejected(reason) => report.reject(stage, idx + 1, raw.trim(), reason),
        }
    }

    (items, report)
}

/// Whether a trimmed line starts with a `-` or `*` bullet marker.
pub fn is_bullet(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(chars.next(), Some('-' | '*')) && chars.next().is_some_and(char::is_whitespace)
}

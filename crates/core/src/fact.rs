//! Fact, verdict and reference value objects.
//!
//! These are the typed contracts between pipeline stages. Every value here is
//! produced by parsing model output; none of them are ever mutated in place —
//! a corrected claim becomes a new value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much the pipeline trusts a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Case-insensitive parse of `High` / `Medium` / `Low`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Confidence implied by a validation outcome.
    ///
    /// An uncorrected `False` is the only Low case: the claim is known wrong
    /// and nothing replaced it.
    pub fn from_verdict(verdict: Verdict, has_correction: bool) -> Self {
        match (verdict, has_correction) {
            (Verdict::True, _) => Self::High,
            (Verdict::False, true) | (Verdict::Uncertain, _) => Self::Medium,
            (Verdict::False, false) => Self::Low,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(s)
    }
}

/// An atomic claim paired with the source it was cited from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// The claim text
    pub text: String,

    /// Citation URL (may be empty when no source survived parsing)
    pub source: String,

    /// Confidence, absent for freshly researched facts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl Fact {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Tri-state validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
    Uncertain,
}

impl Verdict {
    /// Exact, case-sensitive parse of the three verdict words.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "True" => Some(Self::True),
            "False" => Some(Self::False),
            "Uncertain" => Some(Self::Uncertain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Uncertain => "Uncertain",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claim after fact-checking.
///
/// `fact` is the text downstream stages use: the correction when one was
/// supplied, otherwise the original statement. `source` is the citation URL
/// carried over from the research fact the statement was matched to; the
/// verdict and reason live in their own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedFact {
    pub fact: String,
    pub source: String,
    pub verdict: Verdict,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,

    /// The statement exactly as the validator quoted it
    pub statement: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl ValidatedFact {
    /// Build from a parsed validator line. Confidence is derived from the verdict.
    pub fn new(
        statement: impl Into<String>,
        verdict: Verdict,
        reason: impl Into<String>,
        correction: Option<String>,
        source: impl Into<String>,
    ) -> Self {
        let statement = statement.into();
        let correction = correction.filter(|c| !c.trim().is_empty());
        let fact = correction.clone().unwrap_or_else(|| statement.clone());
        Self {
            fact,
            source: source.into(),
            verdict,
            reason: reason.into(),
            confidence: Some(Confidence::from_verdict(verdict, correction.is_some())),
            correction,
            statement,
        }
    }

    /// `"<verdict> - <reason>"`, the annotation stored alongside the fact.
    pub fn verdict_note(&self) -> String {
        format!("{} - {}", self.verdict, self.reason)
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Some(Confidence::Low)
    }

    pub fn to_fact(&self) -> Fact {
        Fact {
            text: self.fact.clone(),
            source: self.source.clone(),
            confidence: self.confidence,
        }
    }
}

/// A deduplicated markdown link used for citation numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub label: String,
    pub url: String,
}

impl Reference {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_replaces_statement() {
        let vf = ValidatedFact::new(
            "The Eiffel Tower is in Berlin.",
            Verdict::False,
            "Wikipedia says it's in Paris",
            Some("The Eiffel Tower is in Paris.".into()),
            "https://example.org/eiffel",
        );
        assert_eq!(vf.fact, "The Eiffel Tower is in Paris.");
        assert_eq!(vf.statement, "The Eiffel Tower is in Berlin.");
        assert_eq!(vf.confidence, Some(Confidence::Medium));
    }

    #[test]
    fn blank_correction_is_ignored() {
        let vf = ValidatedFact::new("Claim", Verdict::False, "wrong", Some("  ".into()), "");
        assert!(vf.correction.is_none());
        assert_eq!(vf.fact, "Claim");
        assert!(vf.is_low_confidence());
    }

    #[test]
    fn verdict_note_format() {
        let vf = ValidatedFact::new("Claim", Verdict::Uncertain, "no source found", None, "");
        assert_eq!(vf.verdict_note(), "Uncertain - no source found");
    }

    #[test]
    fn confidence_from_verdict() {
        assert_eq!(Confidence::from_verdict(Verdict::True, false), Confidence::High);
        assert_eq!(Confidence::from_verdict(Verdict::Uncertain, false), Confidence::Medium);
        assert_eq!(Confidence::from_verdict(Verdict::False, true), Confidence::Medium);
        assert_eq!(Confidence::from_verdict(Verdict::False, false), Confidence::Low);
    }

    #[test]
    fn confidence_parse_is_case_insensitive() {
        assert_eq!(Confidence::parse(" low "), Some(Confidence::Low));
        assert_eq!(Confidence::parse("HIGH"), Some(Confidence::High));
        assert_eq!(Confidence::parse("sure"), None);
    }

    #[test]
    fn verdict_parse_is_exact() {
        assert_eq!(Verdict::parse("True"), Some(Verdict::True));
        assert_eq!(Verdict::parse("true"), None);
    }

    #[test]
    fn research_fact_has_no_confidence() {
        let fact = Fact::new("A solar eclipse occurred in April 2024.", "https://nasa.gov/x");
        assert!(fact.confidence.is_none());
        let json = serde_json::to_string(&fact).unwrap();
        assert!(!json.contains("confidence"));
    }
}

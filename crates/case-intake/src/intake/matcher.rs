use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::catalog::{normalize_text, CasePattern, PatternCatalog};

/// Conversation text after the single canonical normalization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        Self(normalize_text(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.0.contains(phrase)
    }
}

/// Outcome of selecting the best catalog pattern for a text.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch<'a> {
    pub pattern: &'a CasePattern,
    pub pattern_id: String,
    pub matched_keywords: BTreeSet<String>,
    /// Share of the pattern's keywords present in the text.
    pub confidence: f64,
    /// Set when no pattern matched and the catalog fallback was used.
    pub fallback: bool,
}

struct Candidate<'a> {
    pattern: &'a CasePattern,
    matched: BTreeSet<String>,
}

impl Candidate<'_> {
    /// Higher base score, then more matched keywords, then the smaller id.
    fn rank(&self, other: &Self) -> Ordering {
        self.pattern
            .base_score
            .total_cmp(&other.pattern.base_score)
            .then_with(|| self.matched.len().cmp(&other.matched.len()))
            .then_with(|| other.pattern.id.cmp(&self.pattern.id))
    }
}

pub fn match_pattern<'a>(text: &NormalizedText, catalog: &'a PatternCatalog) -> PatternMatch<'a> {
    let best = catalog
        .patterns()
        .iter()
        .filter(|pattern| catalog.is_active(pattern))
        .filter_map(|pattern| {
            let matched: BTreeSet<String> = pattern
                .keywords
                .iter()
                .filter(|keyword| text.contains(keyword))
                .cloned()
                .collect();
            (!matched.is_empty()).then_some(Candidate { pattern, matched })
        })
        .max_by(|a, b| a.rank(b));

    match best {
        Some(Candidate { pattern, matched }) => {
            let confidence = matched.len() as f64 / pattern.keywords.len() as f64;
            PatternMatch {
                pattern,
                pattern_id: pattern.id.clone(),
                matched_keywords: matched,
                confidence,
                fallback: false,
            }
        }
        None => {
            let pattern = catalog.fallback();
            PatternMatch {
                pattern,
                pattern_id: pattern.id.clone(),
                matched_keywords: BTreeSet::new(),
                confidence: 0.0,
                fallback: true,
            }
        }
    }
}

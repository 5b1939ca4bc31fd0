use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::catalog::{CasePattern, PatternCatalog};
use super::matcher::NormalizedText;

/// Table a multiplier phrase was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierSource {
    Pattern,
    Penalty,
}

/// Discrete factor applied to the base score, kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMultiplier {
    pub phrase: String,
    pub factor: f64,
    pub source: MultiplierSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiplierResolution {
    pub combined_factor: f64,
    pub applied: Vec<AppliedMultiplier>,
}

impl MultiplierResolution {
    pub fn phrases(&self) -> BTreeSet<String> {
        self.applied
            .iter()
            .map(|multiplier| multiplier.phrase.clone())
            .collect()
    }
}

/// Folds every pattern multiplier and global penalty present in the text into one factor.
///
/// Each distinct phrase contributes once. A phrase listed in both tables uses the pattern's
/// factor.
pub fn resolve(
    text: &NormalizedText,
    pattern: &CasePattern,
    catalog: &PatternCatalog,
) -> MultiplierResolution {
    let mut hits: BTreeMap<&str, AppliedMultiplier> = BTreeMap::new();

    let tables = [
        (&pattern.multipliers, MultiplierSource::Pattern),
        (catalog.penalties(), MultiplierSource::Penalty),
    ];
    for (table, source) in tables {
        for (phrase, factor) in table {
            if text.contains(phrase) && !hits.contains_key(phrase.as_str()) {
                hits.insert(
                    phrase,
                    AppliedMultiplier {
                        phrase: phrase.clone(),
                        factor: *factor,
                        source,
                    },
                );
            }
        }
    }

    let applied: Vec<AppliedMultiplier> = hits.into_values().collect();
    let combined_factor = applied
        .iter()
        .fold(1.0, |product, multiplier| product * multiplier.factor);

    MultiplierResolution {
        combined_factor,
        applied,
    }
}

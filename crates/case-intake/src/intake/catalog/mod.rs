//! Declarative pattern catalog: case patterns, attorney tiers, urgency levels and the
//! business tables used to classify a score.
//!
//! A [`CatalogConfig`] is plain serde data. [`PatternCatalog::load`] validates it once and the
//! resulting catalog is read-only; runtime changes go through the named update operations,
//! which produce a new, revalidated catalog instead of mutating the shared one.

mod standard;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::domain::{AvailabilityClass, CaseStrength, Urgency};

/// Named rule associating keyword triggers with a base score and routing hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePattern {
    pub id: String,
    pub label: String,
    pub keywords: BTreeSet<String>,
    pub base_score: f64,
    pub case_strength: CaseStrength,
    pub attorney_tier: String,
    pub practice_area: String,
    pub urgency: Urgency,
    #[serde(default)]
    pub multipliers: BTreeMap<String, f64>,
}

/// Attorney seniority band covering an inclusive score range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttorneyTier {
    pub name: String,
    pub min_score: u8,
    pub max_score: u8,
    #[serde(default)]
    pub specialties: BTreeSet<String>,
    pub availability: AvailabilityClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyLevel {
    pub level: Urgency,
    pub threshold: u8,
    pub priority: u8,
    pub response_time: String,
    pub escalation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeArea {
    pub id: String,
    pub enabled: bool,
}

/// Business-priority bucket; the first bucket (by descending minimum) the score reaches wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityLevel {
    pub name: String,
    pub min_score: u8,
    pub action: String,
}

/// Parameters bounding how far a session's score may move between evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub max_decrease_fraction: f64,
    pub min_increase_fraction: f64,
    pub stability_threshold: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_decrease_fraction: 0.2,
            min_increase_fraction: 0.05,
            stability_threshold: 0.8,
        }
    }
}

/// Reply variants for each conversation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub follow_up: Option<String>,
    #[serde(default)]
    pub consultation: Option<String>,
}

impl TemplateSet {
    pub fn first_available(&self) -> Option<&str> {
        self.initial
            .as_deref()
            .or(self.follow_up.as_deref())
            .or(self.consultation.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTemplates {
    pub default: TemplateSet,
    #[serde(default)]
    pub by_pattern: BTreeMap<String, TemplateSet>,
}

/// Complete declarative configuration consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub version: String,
    pub fallback_pattern: String,
    pub practice_areas: Vec<PracticeArea>,
    pub patterns: Vec<CasePattern>,
    pub tiers: Vec<AttorneyTier>,
    pub urgency_levels: Vec<UrgencyLevel>,
    #[serde(default)]
    pub penalties: BTreeMap<String, f64>,
    #[serde(default)]
    pub consistency: ConsistencyConfig,
    pub priority_levels: Vec<PriorityLevel>,
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
    pub revenue_ranges: BTreeMap<u8, String>,
    #[serde(default)]
    pub response_templates: ResponseTemplates,
}

impl CatalogConfig {
    /// The production catalog covering personal injury, criminal defense and general intake.
    pub fn standard() -> Self {
        standard::catalog()
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|source| CatalogError::Parse { source })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }
}

/// Load-time validation failures. The engine refuses to start on any of them.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON: {source}")]
    Parse { source: serde_json::Error },
    #[error("catalog defines no patterns")]
    NoPatterns,
    #[error("pattern '{0}' is defined more than once")]
    DuplicatePattern(String),
    #[error("pattern '{pattern}' has an empty keyword set")]
    EmptyKeywords { pattern: String },
    #[error("pattern '{pattern}' base score {score} is outside [0, 100]")]
    BaseScoreOutOfRange { pattern: String, score: f64 },
    #[error("pattern '{pattern}' references unknown attorney tier '{tier}'")]
    UnknownTier { pattern: String, tier: String },
    #[error("pattern '{pattern}' references undeclared practice area '{area}'")]
    UnknownPracticeArea { pattern: String, area: String },
    #[error("multiplier '{phrase}' has invalid factor {factor}; factors must be finite and > 0")]
    InvalidFactor { phrase: String, factor: f64 },
    #[error("fallback pattern '{0}' is not defined")]
    MissingFallback(String),
    #[error("unknown pattern '{0}'")]
    UnknownPattern(String),
    #[error("unknown practice area '{0}'")]
    UnknownPracticeAreaId(String),
    #[error("catalog defines no attorney tiers")]
    NoTiers,
    #[error("attorney tier '{0}' is defined more than once")]
    DuplicateTier(String),
    #[error("attorney tier '{tier}' has min {min} above max {max}")]
    InvalidTierRange { tier: String, min: u8, max: u8 },
    #[error("attorney tiers '{previous}' and '{next}' are not contiguous")]
    TierBandGap { previous: String, next: String },
    #[error("attorney tiers cover [{min}, {max}] instead of [0, 100]")]
    TierBandsIncomplete { min: u8, max: u8 },
    #[error("catalog defines no urgency levels")]
    NoUrgencyLevels,
    #[error("lowest urgency threshold is {0}; it must be 0")]
    UrgencyFloor(u8),
    #[error("urgency level '{level}' is not monotonic with its predecessor")]
    UrgencyNotMonotonic { level: &'static str },
    #[error("priority levels must include a bucket starting at 0")]
    MissingPriorityFloor,
    #[error("priority minimum {0} is used by more than one bucket")]
    DuplicatePriorityMinimum(u8),
    #[error("priority level '{level}' references unknown action '{action}'")]
    UnknownAction { level: String, action: String },
    #[error("revenue range table is empty")]
    EmptyRevenueTable,
    #[error("consistency parameter {field} = {value} must lie in [0, 1]")]
    InvalidConsistency { field: &'static str, value: f64 },
}

/// Validated, read-only view of a [`CatalogConfig`].
///
/// Tiers and urgency levels are held in ascending order, priority levels in descending order
/// of their minimum score, and every keyword / phrase is stored normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCatalog {
    config: CatalogConfig,
}

impl PatternCatalog {
    pub fn load(mut config: CatalogConfig) -> Result<Self, CatalogError> {
        normalize(&mut config);
        validate_patterns(&config)?;
        validate_tiers(&config.tiers)?;
        validate_urgency(&config.urgency_levels)?;
        validate_business_tables(&config)?;
        validate_consistency(&config.consistency)?;
        Ok(Self { config })
    }

    pub fn standard() -> Result<Self, CatalogError> {
        Self::load(CatalogConfig::standard())
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn patterns(&self) -> &[CasePattern] {
        &self.config.patterns
    }

    pub fn pattern(&self, id: &str) -> Option<&CasePattern> {
        self.config.patterns.iter().find(|pattern| pattern.id == id)
    }

    pub fn fallback(&self) -> &CasePattern {
        // load() guarantees the fallback exists
        self.pattern(&self.config.fallback_pattern)
            .unwrap_or(&self.config.patterns[0])
    }

    /// Whether a pattern may be selected by the matcher.
    pub fn is_active(&self, pattern: &CasePattern) -> bool {
        pattern.id == self.config.fallback_pattern
            || self.practice_area_enabled(&pattern.practice_area)
    }

    pub fn practice_area_enabled(&self, area: &str) -> bool {
        self.config
            .practice_areas
            .iter()
            .any(|candidate| candidate.id == area && candidate.enabled)
    }

    pub fn tiers(&self) -> &[AttorneyTier] {
        &self.config.tiers
    }

    pub fn tier(&self, name: &str) -> Option<&AttorneyTier> {
        self.config.tiers.iter().find(|tier| tier.name == name)
    }

    pub fn urgency_levels(&self) -> &[UrgencyLevel] {
        &self.config.urgency_levels
    }

    pub fn urgency_level(&self, urgency: Urgency) -> Option<&UrgencyLevel> {
        self.config
            .urgency_levels
            .iter()
            .find(|level| level.level == urgency)
    }

    pub fn penalties(&self) -> &BTreeMap<String, f64> {
        &self.config.penalties
    }

    pub fn consistency(&self) -> &ConsistencyConfig {
        &self.config.consistency
    }

    pub fn priority_levels(&self) -> &[PriorityLevel] {
        &self.config.priority_levels
    }

    pub fn action(&self, key: &str) -> Option<&str> {
        self.config.actions.get(key).map(String::as_str)
    }

    pub fn revenue_ranges(&self) -> &BTreeMap<u8, String> {
        &self.config.revenue_ranges
    }

    pub fn templates(&self) -> &ResponseTemplates {
        &self.config.response_templates
    }

    /// Returns a new catalog with the practice area toggled.
    pub fn with_practice_area_enabled(
        &self,
        area: &str,
        enabled: bool,
    ) -> Result<Self, CatalogError> {
        let mut config = self.config.clone();
        let entry = config
            .practice_areas
            .iter_mut()
            .find(|candidate| candidate.id == area)
            .ok_or_else(|| CatalogError::UnknownPracticeAreaId(area.to_string()))?;
        entry.enabled = enabled;
        Self::load(config)
    }

    /// Returns a new catalog with a pattern multiplier inserted or replaced.
    pub fn with_multiplier(
        &self,
        pattern_id: &str,
        phrase: &str,
        factor: f64,
    ) -> Result<Self, CatalogError> {
        let mut config = self.config.clone();
        let pattern = config
            .patterns
            .iter_mut()
            .find(|pattern| pattern.id == pattern_id)
            .ok_or_else(|| CatalogError::UnknownPattern(pattern_id.to_string()))?;
        pattern.multipliers.insert(phrase.to_string(), factor);
        Self::load(config)
    }
}

/// Canonical normalization shared by keyword storage and text matching.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

fn normalize_phrases(table: &mut BTreeMap<String, f64>) {
    let normalized = std::mem::take(table)
        .into_iter()
        .map(|(phrase, factor)| (normalize_text(&phrase), factor))
        .collect();
    *table = normalized;
}

fn normalize(config: &mut CatalogConfig) {
    for pattern in &mut config.patterns {
        pattern.keywords = pattern
            .keywords
            .iter()
            .map(|keyword| normalize_text(keyword))
            .collect();
        normalize_phrases(&mut pattern.multipliers);
    }
    normalize_phrases(&mut config.penalties);

    config.tiers.sort_by_key(|tier| tier.min_score);
    config.urgency_levels.sort_by_key(|level| level.threshold);
    config
        .priority_levels
        .sort_by(|a, b| b.min_score.cmp(&a.min_score));
}

fn validate_factor(phrase: &str, factor: f64) -> Result<(), CatalogError> {
    if phrase.is_empty() || !factor.is_finite() || factor <= 0.0 {
        return Err(CatalogError::InvalidFactor {
            phrase: phrase.to_string(),
            factor,
        });
    }
    Ok(())
}

fn validate_patterns(config: &CatalogConfig) -> Result<(), CatalogError> {
    if config.patterns.is_empty() {
        return Err(CatalogError::NoPatterns);
    }

    let tier_names: BTreeSet<&str> = config.tiers.iter().map(|tier| tier.name.as_str()).collect();
    let areas: BTreeSet<&str> = config
        .practice_areas
        .iter()
        .map(|area| area.id.as_str())
        .collect();
    let mut seen = BTreeSet::new();

    for pattern in &config.patterns {
        if !seen.insert(pattern.id.as_str()) {
            return Err(CatalogError::DuplicatePattern(pattern.id.clone()));
        }
        if pattern.keywords.is_empty() || pattern.keywords.iter().any(String::is_empty) {
            return Err(CatalogError::EmptyKeywords {
                pattern: pattern.id.clone(),
            });
        }
        if !(0.0..=100.0).contains(&pattern.base_score) {
            return Err(CatalogError::BaseScoreOutOfRange {
                pattern: pattern.id.clone(),
                score: pattern.base_score,
            });
        }
        if !tier_names.contains(pattern.attorney_tier.as_str()) {
            return Err(CatalogError::UnknownTier {
                pattern: pattern.id.clone(),
                tier: pattern.attorney_tier.clone(),
            });
        }
        if !areas.contains(pattern.practice_area.as_str()) {
            return Err(CatalogError::UnknownPracticeArea {
                pattern: pattern.id.clone(),
                area: pattern.practice_area.clone(),
            });
        }
        for (phrase, factor) in &pattern.multipliers {
            validate_factor(phrase, *factor)?;
        }
    }

    for (phrase, factor) in &config.penalties {
        validate_factor(phrase, *factor)?;
    }

    if !seen.contains(config.fallback_pattern.as_str()) {
        return Err(CatalogError::MissingFallback(
            config.fallback_pattern.clone(),
        ));
    }

    for pattern_id in config.response_templates.by_pattern.keys() {
        if !seen.contains(pattern_id.as_str()) {
            return Err(CatalogError::UnknownPattern(pattern_id.clone()));
        }
    }

    Ok(())
}

fn validate_tiers(tiers: &[AttorneyTier]) -> Result<(), CatalogError> {
    let (first, last) = match (tiers.first(), tiers.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(CatalogError::NoTiers),
    };

    let mut names = BTreeSet::new();
    for tier in tiers {
        if !names.insert(tier.name.as_str()) {
            return Err(CatalogError::DuplicateTier(tier.name.clone()));
        }
        if tier.min_score > tier.max_score {
            return Err(CatalogError::InvalidTierRange {
                tier: tier.name.clone(),
                min: tier.min_score,
                max: tier.max_score,
            });
        }
    }

    for pair in tiers.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        if u16::from(previous.max_score) + 1 != u16::from(next.min_score) {
            return Err(CatalogError::TierBandGap {
                previous: previous.name.clone(),
                next: next.name.clone(),
            });
        }
    }

    if first.min_score != 0 || last.max_score != 100 {
        return Err(CatalogError::TierBandsIncomplete {
            min: first.min_score,
            max: last.max_score,
        });
    }

    Ok(())
}

fn validate_urgency(levels: &[UrgencyLevel]) -> Result<(), CatalogError> {
    let first = levels.first().ok_or(CatalogError::NoUrgencyLevels)?;
    if first.threshold != 0 {
        return Err(CatalogError::UrgencyFloor(first.threshold));
    }

    for pair in levels.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        let monotonic = next.threshold > previous.threshold
            && next.level > previous.level
            && next.priority > previous.priority;
        if !monotonic {
            return Err(CatalogError::UrgencyNotMonotonic {
                level: next.level.label(),
            });
        }
    }

    Ok(())
}

fn validate_business_tables(config: &CatalogConfig) -> Result<(), CatalogError> {
    let mut minimums = BTreeSet::new();
    for level in &config.priority_levels {
        if !minimums.insert(level.min_score) {
            return Err(CatalogError::DuplicatePriorityMinimum(level.min_score));
        }
        if !config.actions.contains_key(&level.action) {
            return Err(CatalogError::UnknownAction {
                level: level.name.clone(),
                action: level.action.clone(),
            });
        }
    }
    if !minimums.contains(&0) {
        return Err(CatalogError::MissingPriorityFloor);
    }

    if config.revenue_ranges.is_empty() {
        return Err(CatalogError::EmptyRevenueTable);
    }

    Ok(())
}

fn validate_consistency(consistency: &ConsistencyConfig) -> Result<(), CatalogError> {
    let fields = [
        ("max_decrease_fraction", consistency.max_decrease_fraction),
        ("min_increase_fraction", consistency.min_increase_fraction),
        ("stability_threshold", consistency.stability_threshold),
    ];
    for (field, value) in fields {
        if !(0.0..=1.0).contains(&value) {
            return Err(CatalogError::InvalidConsistency { field, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_config() -> CatalogConfig {
        CatalogConfig::standard()
    }

    #[test]
    fn standard_catalog_loads() {
        let catalog = PatternCatalog::standard().expect("standard catalog is valid");
        assert_eq!(catalog.fallback().id, "general-inquiry");
        assert_eq!(catalog.tiers().first().map(|t| t.min_score), Some(0));
        assert_eq!(catalog.tiers().last().map(|t| t.max_score), Some(100));
        assert_eq!(catalog.priority_levels()[0].name, "HIGH VALUE");
    }

    #[test]
    fn rejects_empty_keyword_set() {
        let mut config = standard_config();
        config.patterns[0].keywords.clear();
        let err = PatternCatalog::load(config).expect_err("empty keywords rejected");
        assert!(matches!(err, CatalogError::EmptyKeywords { .. }));
    }

    #[test]
    fn rejects_base_score_out_of_range() {
        let mut config = standard_config();
        config.patterns[0].base_score = 120.0;
        let err = PatternCatalog::load(config).expect_err("score rejected");
        assert!(matches!(err, CatalogError::BaseScoreOutOfRange { score, .. } if score == 120.0));
    }

    #[test]
    fn rejects_unknown_tier_reference() {
        let mut config = standard_config();
        config.patterns[0].attorney_tier = "Of Counsel".to_string();
        let err = PatternCatalog::load(config).expect_err("tier rejected");
        assert!(matches!(err, CatalogError::UnknownTier { tier, .. } if tier == "Of Counsel"));
    }

    #[test]
    fn rejects_tier_gap() {
        let mut config = standard_config();
        config.tiers[1].min_score = 46;
        let err = PatternCatalog::load(config).expect_err("gap rejected");
        assert!(matches!(err, CatalogError::TierBandGap { .. }));
    }

    #[test]
    fn rejects_overlapping_tiers() {
        let mut config = standard_config();
        config.tiers[1].min_score = 40;
        let err = PatternCatalog::load(config).expect_err("overlap rejected");
        assert!(matches!(err, CatalogError::TierBandGap { .. }));
    }

    #[test]
    fn rejects_tiers_not_reaching_bounds() {
        let mut config = standard_config();
        let last = config.tiers.len() - 1;
        config.tiers[last].max_score = 95;
        let err = PatternCatalog::load(config).expect_err("incomplete rejected");
        assert!(matches!(
            err,
            CatalogError::TierBandsIncomplete { min: 0, max: 95 }
        ));
    }

    #[test]
    fn rejects_non_monotonic_urgency() {
        let mut config = standard_config();
        config.urgency_levels[2].threshold = 30;
        let err = PatternCatalog::load(config).expect_err("urgency rejected");
        assert!(matches!(err, CatalogError::UrgencyNotMonotonic { .. }));
    }

    #[test]
    fn rejects_urgency_without_zero_floor() {
        let mut config = standard_config();
        config.urgency_levels[0].threshold = 10;
        let err = PatternCatalog::load(config).expect_err("floor rejected");
        assert!(matches!(err, CatalogError::UrgencyFloor(10)));
    }

    #[test]
    fn rejects_missing_fallback() {
        let mut config = standard_config();
        config.fallback_pattern = "nothing".to_string();
        let err = PatternCatalog::load(config).expect_err("fallback rejected");
        assert!(matches!(err, CatalogError::MissingFallback(id) if id == "nothing"));
    }

    #[test]
    fn rejects_non_positive_factor() {
        let mut config = standard_config();
        config.penalties.insert("lying".to_string(), 0.0);
        let err = PatternCatalog::load(config).expect_err("factor rejected");
        assert!(matches!(err, CatalogError::InvalidFactor { .. }));
    }

    #[test]
    fn rejects_consistency_outside_unit_interval() {
        let mut config = standard_config();
        config.consistency.max_decrease_fraction = 1.5;
        let err = PatternCatalog::load(config).expect_err("consistency rejected");
        assert!(matches!(
            err,
            CatalogError::InvalidConsistency {
                field: "max_decrease_fraction",
                ..
            }
        ));
    }

    #[test]
    fn normalizes_keywords_and_phrases() {
        let mut config = standard_config();
        let keywords = &mut config.patterns[0].keywords;
        keywords.insert("  Red Light ".to_string());
        config.penalties.insert("No Witnesses".to_string(), 0.9);
        let catalog = PatternCatalog::load(config).expect("valid");
        assert!(catalog.patterns()[0].keywords.contains("red light"));
        assert!(catalog.penalties().contains_key("no witnesses"));
    }

    #[test]
    fn practice_area_toggle_produces_new_catalog() {
        let catalog = PatternCatalog::standard().expect("valid");
        assert!(!catalog.practice_area_enabled("family_law"));
        let updated = catalog
            .with_practice_area_enabled("family_law", true)
            .expect("toggle applies");
        assert!(updated.practice_area_enabled("family_law"));
        assert!(!catalog.practice_area_enabled("family_law"));

        let err = catalog
            .with_practice_area_enabled("maritime", true)
            .expect_err("unknown area");
        assert!(matches!(err, CatalogError::UnknownPracticeAreaId(_)));
    }

    #[test]
    fn multiplier_update_is_revalidated() {
        let catalog = PatternCatalog::standard().expect("valid");
        let updated = catalog
            .with_multiplier("slip-and-fall-medical", "Security Footage", 1.3)
            .expect("update applies");
        let pattern = updated.pattern("slip-and-fall-medical").expect("pattern");
        assert_eq!(pattern.multipliers.get("security footage"), Some(&1.3));

        let err = catalog
            .with_multiplier("slip-and-fall-medical", "witness", -1.0)
            .expect_err("negative factor rejected");
        assert!(matches!(err, CatalogError::InvalidFactor { .. }));
    }

    #[test]
    fn parses_json_catalog() {
        let json = serde_json::to_string(&CatalogConfig::standard()).expect("serializes");
        let config = CatalogConfig::from_json(&json).expect("parses");
        assert_eq!(config, CatalogConfig::standard());
        assert!(matches!(
            CatalogConfig::from_json("{"),
            Err(CatalogError::Parse { .. })
        ));
    }
}

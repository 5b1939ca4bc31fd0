use serde::Serialize;

use super::catalog::{CasePattern, PatternCatalog, PriorityLevel, UrgencyLevel};
use super::domain::{CaseStrength, Urgency};

/// Score-derived labels plus the qualitative strength of the matched pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub strength: CaseStrength,
    pub urgency: Urgency,
    pub response_time: String,
    pub priority_bucket: String,
    pub recommended_action: String,
    pub revenue_range: String,
}

pub fn classify(score: f64, pattern: &CasePattern, catalog: &PatternCatalog) -> Classification {
    let urgency = urgency_level(score, catalog);
    let priority = priority_level(score, catalog);
    let recommended_action = catalog
        .action(&priority.action)
        .unwrap_or(priority.action.as_str())
        .to_string();

    Classification {
        strength: pattern.case_strength,
        urgency: urgency.level,
        response_time: urgency.response_time.clone(),
        priority_bucket: priority.name.clone(),
        recommended_action,
        revenue_range: revenue_range(score, catalog).to_string(),
    }
}

/// Highest urgency level whose threshold the score reaches.
pub fn urgency_level(score: f64, catalog: &PatternCatalog) -> &UrgencyLevel {
    let levels = catalog.urgency_levels();
    levels
        .iter()
        .rev()
        .find(|level| score >= f64::from(level.threshold))
        .unwrap_or(&levels[0])
}

/// First bucket, scanning minimums in descending order, that the score reaches.
pub fn priority_level(score: f64, catalog: &PatternCatalog) -> &PriorityLevel {
    let levels = catalog.priority_levels();
    levels
        .iter()
        .find(|level| score >= f64::from(level.min_score))
        .unwrap_or(&levels[levels.len() - 1])
}

/// Floor lookup: the range keyed at the largest score not above `score`.
pub fn revenue_range(score: f64, catalog: &PatternCatalog) -> &str {
    let ranges = catalog.revenue_ranges();
    let key = score.clamp(0.0, 100.0).floor() as u8;
    ranges
        .range(..=key)
        .next_back()
        .or_else(|| ranges.iter().next())
        .map(|(_, range)| range.as_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PatternCatalog {
        PatternCatalog::standard().expect("standard catalog")
    }

    #[test]
    fn urgency_uses_highest_reached_threshold() {
        let catalog = catalog();
        assert_eq!(urgency_level(0.0, &catalog).level, Urgency::Low);
        assert_eq!(urgency_level(64.9, &catalog).level, Urgency::Low);
        assert_eq!(urgency_level(65.0, &catalog).level, Urgency::Medium);
        assert_eq!(urgency_level(80.0, &catalog).level, Urgency::High);
        assert_eq!(urgency_level(100.0, &catalog).level, Urgency::High);
    }

    #[test]
    fn priority_buckets_follow_descending_minimums() {
        let catalog = catalog();
        assert_eq!(priority_level(85.0, &catalog).name, "HIGH VALUE");
        assert_eq!(priority_level(60.0, &catalog).name, "MEDIUM");
        assert_eq!(priority_level(59.9, &catalog).name, "STANDARD");
        assert_eq!(priority_level(5.0, &catalog).name, "LOW");
    }

    #[test]
    fn revenue_range_is_a_floor_lookup() {
        let catalog = catalog();
        assert_eq!(revenue_range(72.0, &catalog), "$25k-$100k");
        assert_eq!(revenue_range(65.0, &catalog), "$25k-$100k");
        assert_eq!(revenue_range(100.0, &catalog), "$100k-$500k+");
        assert_eq!(revenue_range(10.0, &catalog), "$1k-$10k");
    }

    #[test]
    fn strength_comes_from_pattern_not_score() {
        let catalog = catalog();
        let pattern = catalog.pattern("dui-collision-medical").expect("pattern");
        let classification = classify(30.0, pattern, &catalog);
        assert_eq!(classification.strength, CaseStrength::VeryStrong);
        assert_eq!(classification.urgency, Urgency::Low);
        assert_eq!(classification.priority_bucket, "LOW");
        assert_eq!(classification.recommended_action, "Gather more information");
    }

    #[test]
    fn every_integer_score_resolves_to_one_band() {
        let catalog = catalog();
        for score in 0..=100u8 {
            let score = f64::from(score);
            let urgency_hits = catalog
                .urgency_levels()
                .windows(2)
                .filter(|pair| {
                    score >= f64::from(pair[0].threshold) && score < f64::from(pair[1].threshold)
                })
                .count()
                + usize::from(
                    catalog
                        .urgency_levels()
                        .last()
                        .is_some_and(|level| score >= f64::from(level.threshold)),
                );
            assert_eq!(urgency_hits, 1, "urgency bands for {score}");

            let bucket = priority_level(score, &catalog);
            let bucket_hits = catalog
                .priority_levels()
                .iter()
                .filter(|level| {
                    score >= f64::from(level.min_score)
                        && catalog
                            .priority_levels()
                            .iter()
                            .filter(|other| other.min_score > level.min_score)
                            .all(|other| score < f64::from(other.min_score))
                })
                .count();
            assert_eq!(bucket_hits, 1, "priority buckets for {score}");
            assert!(score >= f64::from(bucket.min_score));
            assert!(!revenue_range(score, &catalog).is_empty());
        }
    }
}

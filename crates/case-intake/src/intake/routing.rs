use tracing::warn;

use super::catalog::{AttorneyTier, CasePattern, PatternCatalog};
use super::domain::{AvailabilityClass, Urgency};

/// Attorney tier assignment for a scored case.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision<'a> {
    pub tier: &'a AttorneyTier,
    /// Urgency the decision was made on: the higher of the score-derived and pattern urgency.
    pub urgency: Urgency,
    pub escalated: bool,
    /// Score fell outside every configured band; the lowest tier was assigned.
    pub inconsistency: bool,
    /// A higher tier from an earlier turn was kept instead of the score-derived one.
    pub retained: bool,
}

pub fn route<'a>(
    score: f64,
    pattern: &CasePattern,
    urgency: Urgency,
    catalog: &'a PatternCatalog,
) -> RoutingDecision<'a> {
    let tiers = catalog.tiers();
    let urgency = urgency.max(pattern.urgency);

    let (index, inconsistency) = match band_index(score, tiers) {
        Some(index) => (index, false),
        None => {
            warn!(
                score,
                pattern = %pattern.id,
                "score outside configured attorney tiers; routing to lowest tier"
            );
            (0, true)
        }
    };

    let banded = &tiers[index];
    let escalate = urgency == Urgency::High && banded.availability != AvailabilityClass::Premium;
    let (tier, escalated) = match tiers.get(index + 1) {
        Some(next) if escalate => (next, true),
        _ => (banded, false),
    };

    RoutingDecision {
        tier,
        urgency,
        escalated,
        inconsistency,
        retained: false,
    }
}

/// Keeps a session on the higher of its previously routed tier and `decision`'s tier, ranked
/// by band position. A previous tier the catalog no longer declares is ignored.
pub fn retain_tier<'a>(
    decision: RoutingDecision<'a>,
    previous: Option<&str>,
    catalog: &'a PatternCatalog,
) -> RoutingDecision<'a> {
    let tiers = catalog.tiers();
    let rank = |name: &str| tiers.iter().position(|tier| tier.name == name);
    let Some(previous_index) = previous.and_then(rank) else {
        return decision;
    };
    match rank(&decision.tier.name) {
        Some(current) if current >= previous_index => decision,
        _ => RoutingDecision {
            tier: &tiers[previous_index],
            retained: true,
            ..decision
        },
    }
}

/// Index of the tier whose band holds `score`; fractional scores between two integer bands
/// belong to the lower one.
fn band_index(score: f64, tiers: &[AttorneyTier]) -> Option<usize> {
    let last = tiers.last()?;
    if !score.is_finite() || score > f64::from(last.max_score) {
        return None;
    }
    tiers
        .iter()
        .rposition(|tier| score >= f64::from(tier.min_score))
}

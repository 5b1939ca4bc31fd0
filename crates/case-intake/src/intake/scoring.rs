use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::{ConsistencyConfig, PatternCatalog};
use super::domain::{CaseState, ScoreHistoryEntry, SessionId};
use super::matcher::{match_pattern, NormalizedText, PatternMatch};
use super::multipliers::{resolve, MultiplierResolution};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Direction the session score moved on the latest evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Rising,
    Falling,
    Steady,
}

/// Result of scoring one conversation turn against the prior session state.
#[derive(Debug, Clone)]
pub struct ScoreEvaluation<'a> {
    pub state: CaseState,
    /// Movement relative to the prior score; zero on the first evaluation.
    pub score_delta: f64,
    pub raw_score: f64,
    pub pattern_match: PatternMatch<'a>,
    pub multipliers: MultiplierResolution,
    pub new_information: bool,
    pub trajectory: Trajectory,
    pub stable: bool,
    pub prior_clamped: bool,
}

impl ScoreEvaluation<'_> {
    pub fn final_score(&self) -> f64 {
        self.state.current_score.unwrap_or(self.raw_score)
    }
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Scores `text` and reconciles the result with the session's previous score.
pub fn evaluate<'a>(
    session_id: &SessionId,
    text: &str,
    catalog: &'a PatternCatalog,
    prior: Option<CaseState>,
    now: DateTime<Utc>,
) -> ScoreEvaluation<'a> {
    let text = NormalizedText::new(text);
    let pattern_match = match_pattern(&text, catalog);
    let multipliers = resolve(&text, pattern_match.pattern, catalog);
    let raw_score = clamp_score(pattern_match.pattern.base_score * multipliers.combined_factor);

    let mut state = prior.unwrap_or_else(|| CaseState::new(session_id.clone(), now));
    let (prior_score, prior_clamped) = sanitize_prior(&state);

    let phrases = multipliers.phrases();
    let same_pattern =
        state.matched_pattern_id.as_deref() == Some(pattern_match.pattern_id.as_str());
    let new_information = !same_pattern || state.matched_phrases != phrases;

    let consistency = catalog.consistency();
    let final_score = match prior_score {
        None => raw_score,
        Some(prior) => reconcile(prior, raw_score, new_information, consistency),
    };

    let score_delta = prior_score.map_or(0.0, |prior| final_score - prior);
    let trajectory = match prior_score {
        Some(prior) if final_score > prior => Trajectory::Rising,
        Some(prior) if final_score < prior => Trajectory::Falling,
        _ => Trajectory::Steady,
    };
    let stable = prior_score.is_some_and(|prior| {
        let (low, high) = if prior <= final_score {
            (prior, final_score)
        } else {
            (final_score, prior)
        };
        high == 0.0 || low / high >= consistency.stability_threshold
    });

    state.current_score = Some(final_score);
    state.matched_pattern_id = Some(pattern_match.pattern_id.clone());
    state.matched_phrases = phrases;
    state.record(ScoreHistoryEntry {
        score: final_score,
        pattern_id: pattern_match.pattern_id.clone(),
        timestamp: now,
    });

    debug!(
        session = %session_id,
        pattern = %pattern_match.pattern_id,
        raw_score,
        final_score,
        score_delta,
        "case evaluated"
    );

    ScoreEvaluation {
        state,
        score_delta,
        raw_score,
        pattern_match,
        multipliers,
        new_information,
        trajectory,
        stable,
        prior_clamped,
    }
}

/// Bounded decrease, floor on increases backed by new information.
fn reconcile(prior: f64, raw: f64, new_information: bool, consistency: &ConsistencyConfig) -> f64 {
    let delta = raw - prior;
    let reconciled = if delta < 0.0 {
        raw.max(prior * (1.0 - consistency.max_decrease_fraction))
    } else {
        let minimum = prior * consistency.min_increase_fraction;
        if delta > 0.0 && delta < minimum && new_information {
            prior + minimum
        } else {
            raw
        }
    };
    clamp_score(reconciled)
}

fn sanitize_prior(state: &CaseState) -> (Option<f64>, bool) {
    match state.current_score {
        None => (None, false),
        Some(score) if !score.is_finite() => {
            warn!(
                session = %state.session_id,
                "discarding non-finite prior score; treating as first evaluation"
            );
            (None, true)
        }
        Some(score) if !(MIN_SCORE..=MAX_SCORE).contains(&score) => {
            let clamped = clamp_score(score);
            warn!(
                session = %state.session_id,
                prior = score,
                clamped,
                "prior score outside [0, 100]; clamped"
            );
            (Some(clamped), true)
        }
        Some(score) => (Some(score), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog() -> PatternCatalog {
        PatternCatalog::standard().expect("standard catalog")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid time")
    }

    fn state_with(score: f64, pattern: &str) -> CaseState {
        let mut state = CaseState::new(SessionId::new("s-1"), now());
        state.current_score = Some(score);
        state.matched_pattern_id = Some(pattern.to_string());
        state
    }

    #[test]
    fn reconcile_caps_decrease() {
        let consistency = ConsistencyConfig::default();
        let score = reconcile(70.0, 10.0, true, &consistency);
        assert!(score >= 56.0 - 1e-9);
        assert!(score < 70.0);
    }

    #[test]
    fn reconcile_raises_small_increase_with_new_information() {
        let consistency = ConsistencyConfig::default();
        assert!((reconcile(60.0, 61.0, true, &consistency) - 63.0).abs() < 1e-9);
        assert_eq!(reconcile(60.0, 61.0, false, &consistency), 61.0);
        assert_eq!(reconcile(60.0, 90.0, true, &consistency), 90.0);
        assert_eq!(reconcile(60.0, 60.0, true, &consistency), 60.0);
    }

    #[test]
    fn first_evaluation_takes_raw_score() {
        let catalog = catalog();
        let evaluation = evaluate(&SessionId::new("s-1"), "hello", &catalog, None, now());
        assert_eq!(evaluation.final_score(), 20.0);
        assert_eq!(evaluation.score_delta, 0.0);
        assert_eq!(evaluation.trajectory, Trajectory::Steady);
        assert!(!evaluation.stable);
        assert_eq!(evaluation.state.history().len(), 1);
    }

    #[test]
    fn raw_score_is_clamped_to_hundred() {
        let catalog = catalog();
        let evaluation = evaluate(
            &SessionId::new("s-1"),
            "drunk driver rear-end, emergency room then surgery",
            &catalog,
            None,
            now(),
        );
        assert_eq!(evaluation.raw_score, 100.0);
        assert_eq!(evaluation.final_score(), 100.0);
    }

    #[test]
    fn history_is_appended_per_evaluation() {
        let catalog = catalog();
        let session = SessionId::new("s-1");
        let first = evaluate(&session, "hello", &catalog, None, now());
        let second = evaluate(
            &session,
            "hello, I slipped on a wet floor",
            &catalog,
            Some(first.state.clone()),
            now(),
        );
        let history = second.state.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], first.state.history()[0]);
        assert_eq!(history[1].pattern_id, "slip-and-fall-medical");
    }

    #[test]
    fn out_of_range_prior_is_clamped_and_flagged() {
        let catalog = catalog();
        let prior = state_with(140.0, "general-inquiry");
        let session = SessionId::new("s-1");
        let evaluation = evaluate(&session, "hello", &catalog, Some(prior), now());
        assert!(evaluation.prior_clamped);
        assert!(evaluation.final_score() >= 80.0 - 1e-9);
        assert!(evaluation.final_score() <= 100.0);
    }

    #[test]
    fn non_finite_prior_is_treated_as_absent() {
        let catalog = catalog();
        let prior = state_with(f64::NAN, "general-inquiry");
        let session = SessionId::new("s-1");
        let evaluation = evaluate(&session, "hello", &catalog, Some(prior), now());
        assert!(evaluation.prior_clamped);
        assert_eq!(evaluation.final_score(), 20.0);
    }

    #[test]
    fn stability_reflects_threshold() {
        let catalog = catalog();
        let prior = state_with(65.0, "slip-and-fall-medical");
        let evaluation = evaluate(
            &SessionId::new("s-1"),
            "I slipped on a wet floor",
            &catalog,
            Some(prior),
            now(),
        );
        assert_eq!(evaluation.trajectory, Trajectory::Steady);
        assert!(evaluation.stable);
        assert!(!evaluation.new_information);
    }
}

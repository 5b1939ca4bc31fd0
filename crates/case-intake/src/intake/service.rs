use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::catalog::{CatalogError, PatternCatalog};
use super::classifier::classify;
use super::domain::{CaseState, SessionId, Urgency};
use super::guidance::{
    conversation_stage, next_question, render_reply, select_template, ConversationStage,
};
use super::matcher::NormalizedText;
use super::multipliers::AppliedMultiplier;
use super::repository::{SessionStore, StoreError};
use super::routing::{retain_tier, route};
use super::scoring::{evaluate, Trajectory};

/// Structured result handed to the chat response layer for one conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseAssessment {
    pub session_id: SessionId,
    pub score: f64,
    pub raw_score: f64,
    pub score_delta: f64,
    pub strength: String,
    pub urgency: Urgency,
    pub priority_bucket: String,
    pub revenue_range: String,
    pub attorney_tier: String,
    pub matched_pattern: String,
    pub escalation_required: bool,
    pub practice_area: String,
    pub matched_keywords: BTreeSet<String>,
    pub applied_multipliers: Vec<AppliedMultiplier>,
    pub confidence: f64,
    pub stable: bool,
    pub trajectory: Trajectory,
    pub stage: ConversationStage,
    pub recommended_action: String,
    pub response_time: String,
    pub recommended_tier: String,
    pub tier_escalated: bool,
    /// The session kept a higher tier assigned on an earlier turn.
    pub tier_retained: bool,
    pub suggested_reply: String,
    pub next_question: String,
    pub prior_clamped: bool,
    pub routing_inconsistency: bool,
    pub catalog_version: String,
}

/// Runs the full pipeline for one turn: match, resolve multipliers, reconcile the score,
/// classify and route. Pure with respect to its inputs.
pub fn assess_case(
    session_id: &SessionId,
    text: &str,
    catalog: &PatternCatalog,
    prior: Option<CaseState>,
    now: DateTime<Utc>,
) -> (CaseAssessment, CaseState) {
    let evaluation = evaluate(session_id, text, catalog, prior, now);
    let score = evaluation.final_score();
    let pattern = evaluation.pattern_match.pattern;

    let classification = classify(score, pattern, catalog);
    let decision = route(score, pattern, classification.urgency, catalog);
    let decision = retain_tier(decision, evaluation.state.routed_tier.as_deref(), catalog);
    let urgency_level = catalog.urgency_level(decision.urgency);
    let escalation_required = urgency_level.is_some_and(|level| level.escalation);
    let response_time = urgency_level
        .map(|level| level.response_time.clone())
        .unwrap_or(classification.response_time);

    let stage = conversation_stage(evaluation.state.turns(), score);
    let strength = classification.strength.label();
    let template = render_reply(
        select_template(catalog, &pattern.id, stage),
        &decision.tier.name,
        strength,
    );
    let question = next_question(&NormalizedText::new(text), score, &decision.tier.name);
    let suggested_reply = format!("{template} {question}");

    let assessment = CaseAssessment {
        session_id: session_id.clone(),
        score,
        raw_score: evaluation.raw_score,
        score_delta: evaluation.score_delta,
        strength: strength.to_string(),
        urgency: decision.urgency,
        priority_bucket: classification.priority_bucket,
        revenue_range: classification.revenue_range,
        attorney_tier: decision.tier.name.clone(),
        matched_pattern: pattern.id.clone(),
        escalation_required,
        practice_area: pattern.practice_area.clone(),
        matched_keywords: evaluation.pattern_match.matched_keywords,
        applied_multipliers: evaluation.multipliers.applied,
        confidence: evaluation.pattern_match.confidence,
        stable: evaluation.stable,
        trajectory: evaluation.trajectory,
        stage,
        recommended_action: classification.recommended_action,
        response_time,
        recommended_tier: pattern.attorney_tier.clone(),
        tier_escalated: decision.escalated,
        tier_retained: decision.retained,
        suggested_reply,
        next_question: question,
        prior_clamped: evaluation.prior_clamped,
        routing_inconsistency: decision.inconsistency,
        catalog_version: catalog.version().to_string(),
    };

    let mut state = evaluation.state;
    state.routed_tier = Some(decision.tier.name.clone());
    (assessment, state)
}

/// Per-session mutexes so evaluations of one session never interleave.
#[derive(Default)]
struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    fn acquire(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(session_id.clone()).or_default().clone()
    }

    /// Drops the table entry once no other caller holds the session lock.
    fn release(&self, session_id: &SessionId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(session_id);
        }
    }
}

/// Service composing the catalog, session store and scoring pipeline.
pub struct IntakeService<S> {
    catalog: RwLock<Arc<PatternCatalog>>,
    store: Arc<S>,
    locks: SessionLocks,
}

impl<S> IntakeService<S>
where
    S: SessionStore + 'static,
{
    pub fn new(store: Arc<S>, catalog: PatternCatalog) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            store,
            locks: SessionLocks::default(),
        }
    }

    /// Snapshot of the catalog currently used for evaluations.
    pub fn catalog(&self) -> Arc<PatternCatalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Score the accumulated conversation text for a session and persist the new state.
    pub fn evaluate_case(
        &self,
        session_id: &SessionId,
        conversation_text: &str,
    ) -> Result<CaseAssessment, IntakeServiceError> {
        self.evaluate_case_at(session_id, conversation_text, Utc::now())
    }

    pub fn evaluate_case_at(
        &self,
        session_id: &SessionId,
        conversation_text: &str,
        now: DateTime<Utc>,
    ) -> Result<CaseAssessment, IntakeServiceError> {
        let lock = self.locks.acquire(session_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.evaluate_locked(session_id, conversation_text, now)
        };
        self.locks.release(session_id, lock);
        result
    }

    fn evaluate_locked(
        &self,
        session_id: &SessionId,
        conversation_text: &str,
        now: DateTime<Utc>,
    ) -> Result<CaseAssessment, IntakeServiceError> {
        let catalog = self.catalog();
        let prior = self.store.get(session_id)?;
        let (assessment, state) =
            assess_case(session_id, conversation_text, &catalog, prior, now);

        self.store.put(state)?;
        info!(
            session = %session_id,
            pattern = %assessment.matched_pattern,
            score = assessment.score,
            tier = %assessment.attorney_tier,
            escalation = assessment.escalation_required,
            "case assessed"
        );
        Ok(assessment)
    }

    /// Current state and audit history for a session.
    pub fn session(&self, session_id: &SessionId) -> Result<Option<CaseState>, IntakeServiceError> {
        Ok(self.store.get(session_id)?)
    }

    pub fn set_practice_area_enabled(
        &self,
        area: &str,
        enabled: bool,
    ) -> Result<(), IntakeServiceError> {
        self.update_catalog(|catalog| catalog.with_practice_area_enabled(area, enabled))?;
        info!(area, enabled, "practice area updated");
        Ok(())
    }

    pub fn set_multiplier(
        &self,
        pattern: &str,
        phrase: &str,
        factor: f64,
    ) -> Result<(), IntakeServiceError> {
        self.update_catalog(|catalog| catalog.with_multiplier(pattern, phrase, factor))?;
        info!(pattern, phrase, factor, "pattern multiplier updated");
        Ok(())
    }

    fn update_catalog<F>(&self, update: F) -> Result<(), IntakeServiceError>
    where
        F: FnOnce(&PatternCatalog) -> Result<PatternCatalog, CatalogError>,
    {
        let mut guard = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let updated = update(&guard)?;
        *guard = Arc::new(updated);
        Ok(())
    }
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

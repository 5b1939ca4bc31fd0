//! Legal case intake scoring.
//!
//! A conversation turn flows through the pattern matcher, multiplier resolution and the
//! consistency reconciler before the reconciled score is classified and routed to an attorney
//! tier. Per-session state is kept behind [`SessionStore`] and every score change is appended
//! to the session's audit history.

pub mod catalog;
pub mod classifier;
pub mod domain;
pub mod guidance;
pub mod matcher;
pub mod multipliers;
pub mod repository;
pub mod router;
pub mod routing;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{
    AttorneyTier, CasePattern, CatalogConfig, CatalogError, ConsistencyConfig, PatternCatalog,
    PracticeArea, PriorityLevel, UrgencyLevel,
};
pub use domain::{
    AvailabilityClass, CaseState, CaseStrength, ScoreHistoryEntry, SessionId, Urgency,
};
pub use guidance::ConversationStage;
pub use multipliers::{AppliedMultiplier, MultiplierSource};
pub use repository::{InMemorySessionStore, SessionStore, StoreError};
pub use router::intake_router;
pub use scoring::Trajectory;
pub use service::{assess_case, CaseAssessment, IntakeService, IntakeServiceError};

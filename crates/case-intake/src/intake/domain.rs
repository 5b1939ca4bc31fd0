use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a chat session / prospective case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Qualitative strength of the case narrative, declared per pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseStrength {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl CaseStrength {
    pub const fn label(self) -> &'static str {
        match self {
            CaseStrength::VeryWeak => "Very Weak",
            CaseStrength::Weak => "Weak",
            CaseStrength::Moderate => "Moderate",
            CaseStrength::Strong => "Strong",
            CaseStrength::VeryStrong => "Very Strong",
        }
    }
}

/// Response-time urgency. Ordering follows escalation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// Staffing availability attached to an attorney tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityClass {
    Standard,
    High,
    Premium,
}

/// Audit entry appended on every evaluation of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistoryEntry {
    pub score: f64,
    pub pattern_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-session scoring state carried between conversation turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseState {
    pub session_id: SessionId,
    pub current_score: Option<f64>,
    pub matched_pattern_id: Option<String>,
    #[serde(default)]
    pub matched_phrases: BTreeSet<String>,
    /// Highest attorney tier the session has been routed to.
    #[serde(default)]
    pub routed_tier: Option<String>,
    #[serde(default)]
    history: Vec<ScoreHistoryEntry>,
    pub last_activity: DateTime<Utc>,
}

impl CaseState {
    pub fn new(session_id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            current_score: None,
            matched_pattern_id: None,
            matched_phrases: BTreeSet::new(),
            routed_tier: None,
            history: Vec::new(),
            last_activity: now,
        }
    }

    pub fn history(&self) -> &[ScoreHistoryEntry] {
        &self.history
    }

    /// Number of evaluations recorded for the session.
    pub fn turns(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn record(&mut self, entry: ScoreHistoryEntry) {
        self.last_activity = entry.timestamp;
        self.history.push(entry);
    }
}

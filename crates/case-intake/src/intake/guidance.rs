use serde::{Deserialize, Serialize};

use super::catalog::PatternCatalog;
use super::matcher::NormalizedText;

const QUALIFIED_LEAD_SCORE: f64 = 80.0;
const QUALIFICATION_SCORE: f64 = 60.0;

/// Where the conversation stands from the intake team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    Initial,
    InformationGathering,
    CaseQualification,
    QualifiedLead,
}

pub fn conversation_stage(turns: usize, score: f64) -> ConversationStage {
    if turns <= 1 {
        ConversationStage::Initial
    } else if score >= QUALIFIED_LEAD_SCORE {
        ConversationStage::QualifiedLead
    } else if score >= QUALIFICATION_SCORE {
        ConversationStage::CaseQualification
    } else {
        ConversationStage::InformationGathering
    }
}

/// Picks the reply template for the matched pattern and stage, falling back to the catalog's
/// default set.
pub fn select_template<'a>(
    catalog: &'a PatternCatalog,
    pattern_id: &str,
    stage: ConversationStage,
) -> &'a str {
    let templates = catalog.templates();
    let set = templates
        .by_pattern
        .get(pattern_id)
        .unwrap_or(&templates.default);

    let staged = match stage {
        ConversationStage::Initial => set.initial.as_deref(),
        ConversationStage::CaseQualification => set.follow_up.as_deref(),
        ConversationStage::QualifiedLead => set.consultation.as_deref(),
        ConversationStage::InformationGathering => None,
    };

    staged
        .or_else(|| set.first_available())
        .or_else(|| templates.default.first_available())
        .unwrap_or_default()
}

pub fn render_reply(template: &str, attorney: &str, assessment: &str) -> String {
    template
        .replace("{attorney}", attorney)
        .replace("{assessment}", &assessment.to_lowercase())
}

/// Follow-up question that moves the intake forward from what the caller has said so far.
pub fn next_question(text: &NormalizedText, score: f64, attorney: &str) -> String {
    if score >= QUALIFIED_LEAD_SCORE {
        format!("When would you like to meet with our {attorney}?")
    } else if text.contains("emergency room") && !text.contains("missed work") {
        "Have you missed any work due to your injuries?".to_string()
    } else if text.contains("rear-end") && !text.contains("medical") {
        "Did you receive any medical treatment after the accident?".to_string()
    } else {
        "Can you tell me more about your situation?".to_string()
    }
}

use crate::infra::load_catalog;
use case_intake::config::AppConfig;
use case_intake::error::AppError;
use case_intake::intake::{
    CaseAssessment, InMemorySessionStore, IntakeService, PatternCatalog, SessionId,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Session identifier for the conversation
    #[arg(long, default_value = "cli-session")]
    pub(crate) session: String,
    /// Catalog JSON to use instead of INTAKE_CATALOG_PATH or the built-in catalog
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Print each assessment as JSON
    #[arg(long)]
    pub(crate) json: bool,
    /// Conversation messages, scored cumulatively in order
    #[arg(required = true)]
    pub(crate) messages: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogCheckArgs {
    /// Catalog JSON to validate (defaults to the built-in catalog)
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        session,
        catalog,
        json,
        messages,
    } = args;

    let config = AppConfig::load()?;
    let catalog_path = catalog.or(config.intake.catalog_path);
    let catalog = load_catalog(catalog_path.as_deref())?;
    let service = IntakeService::new(Arc::new(InMemorySessionStore::default()), catalog);
    let session_id = SessionId::new(session);

    let mut transcript = String::new();
    for (turn, message) in messages.iter().enumerate() {
        if !transcript.is_empty() {
            transcript.push(' ');
        }
        transcript.push_str(message);

        let assessment = service.evaluate_case(&session_id, &transcript)?;
        if json {
            let rendered =
                serde_json::to_string_pretty(&assessment).map_err(std::io::Error::from)?;
            println!("{rendered}");
        } else {
            print!("{}", render_assessment(turn + 1, message, &assessment));
        }
    }

    Ok(())
}

pub(crate) fn run_catalog_check(args: CatalogCheckArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.path.as_deref())?;
    print!("{}", render_catalog_summary(&catalog));
    Ok(())
}

fn render_assessment(turn: usize, message: &str, assessment: &CaseAssessment) -> String {
    let mut out = String::new();
    out.push_str(&format!("Turn {turn}: {message}\n"));
    out.push_str(&format!(
        "  Score: {:.1} (raw {:.1}, delta {:+.1}, {:?})\n",
        assessment.score, assessment.raw_score, assessment.score_delta, assessment.trajectory
    ));
    out.push_str(&format!(
        "  Pattern: {} [{}] confidence {:.2}\n",
        assessment.matched_pattern, assessment.practice_area, assessment.confidence
    ));
    out.push_str(&format!(
        "  Strength: {} | Urgency: {} ({}) | Priority: {}\n",
        assessment.strength,
        assessment.urgency.label(),
        assessment.response_time,
        assessment.priority_bucket
    ));
    let tier_note = if assessment.tier_escalated {
        " (escalated)"
    } else if assessment.tier_retained {
        " (retained)"
    } else {
        ""
    };
    out.push_str(&format!(
        "  Attorney: {}{} | Revenue: {}\n",
        assessment.attorney_tier, tier_note, assessment.revenue_range
    ));
    out.push_str(&format!("  Next step: {}\n", assessment.recommended_action));
    out.push_str(&format!("  Reply: {}\n", assessment.suggested_reply));
    out
}

fn render_catalog_summary(catalog: &PatternCatalog) -> String {
    let mut out = String::new();
    out.push_str(&format!("Catalog {} is valid\n", catalog.version()));

    let active = catalog
        .patterns()
        .iter()
        .filter(|pattern| catalog.is_active(pattern))
        .count();
    out.push_str(&format!(
        "  Patterns: {} ({} active, fallback {})\n",
        catalog.patterns().len(),
        active,
        catalog.fallback().id
    ));

    for tier in catalog.tiers() {
        out.push_str(&format!(
            "  Tier {}: {}-{}\n",
            tier.name, tier.min_score, tier.max_score
        ));
    }
    for level in catalog.urgency_levels() {
        out.push_str(&format!(
            "  Urgency {} from {} ({})\n",
            level.level.label(),
            level.threshold,
            level.response_time
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_summary_lists_tiers() {
        let catalog = PatternCatalog::standard().expect("standard catalog");
        let summary = render_catalog_summary(&catalog);
        assert!(summary.starts_with("Catalog 2024.1 is valid"));
        assert!(summary.contains("Tier Senior Partner: 80-100"));
        assert!(summary.contains("fallback general-inquiry"));
    }

    #[test]
    fn assessment_rendering_mentions_tier_and_reply() {
        let catalog = PatternCatalog::standard().expect("standard catalog");
        let service = IntakeService::new(Arc::new(InMemorySessionStore::default()), catalog);
        let assessment = service
            .evaluate_case(&SessionId::new("render"), "drunk driver, hospital")
            .expect("evaluation succeeds");

        let rendered = render_assessment(1, "drunk driver, hospital", &assessment);
        assert!(rendered.contains("Attorney: Senior Partner"));
        assert!(rendered.contains("Reply: "));
        let question = "When would you like to meet with our Senior Partner?";
        assert!(rendered.contains(question));
    }
}

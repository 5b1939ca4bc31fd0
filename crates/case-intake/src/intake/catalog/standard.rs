use std::collections::{BTreeMap, BTreeSet};

use super::{
    AttorneyTier, CasePattern, CatalogConfig, ConsistencyConfig, PracticeArea, PriorityLevel,
    ResponseTemplates, TemplateSet, UrgencyLevel,
};
use crate::intake::domain::{AvailabilityClass, CaseStrength, Urgency};

const PERSONAL_INJURY: &str = "personal_injury";
const CRIMINAL_DEFENSE: &str = "criminal_defense";
const GENERAL: &str = "general";

const JUNIOR_ATTORNEY: &str = "Junior Attorney";
const ASSOCIATE_ATTORNEY: &str = "Associate Attorney";
const SENIOR_ATTORNEY: &str = "Senior Attorney";
const SENIOR_PARTNER: &str = "Senior Partner";

fn strings(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn factors(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
    values
        .iter()
        .map(|(phrase, factor)| (phrase.to_string(), *factor))
        .collect()
}

struct PatternSpec<'a> {
    id: &'a str,
    label: &'a str,
    keywords: &'a [&'a str],
    base_score: f64,
    case_strength: CaseStrength,
    attorney_tier: &'a str,
    practice_area: &'a str,
    urgency: Urgency,
    multipliers: &'a [(&'a str, f64)],
}

impl PatternSpec<'_> {
    fn build(&self) -> CasePattern {
        CasePattern {
            id: self.id.to_string(),
            label: self.label.to_string(),
            keywords: strings(self.keywords),
            base_score: self.base_score,
            case_strength: self.case_strength,
            attorney_tier: self.attorney_tier.to_string(),
            practice_area: self.practice_area.to_string(),
            urgency: self.urgency,
            multipliers: factors(self.multipliers),
        }
    }
}

fn patterns() -> Vec<CasePattern> {
    let specs = [
        PatternSpec {
            id: "dui-collision-medical",
            label: "drunk driver + rear-end + medical treatment",
            keywords: &[
                "drunk",
                "dui",
                "intoxicated",
                "rear-end",
                "medical",
                "hospital",
            ],
            base_score: 85.0,
            case_strength: CaseStrength::VeryStrong,
            attorney_tier: SENIOR_PARTNER,
            practice_area: PERSONAL_INJURY,
            urgency: Urgency::High,
            multipliers: &[
                ("emergency room", 1.2),
                ("surgery", 1.5),
                ("specialist", 1.3),
                ("missed work", 1.2),
                ("lost wages", 1.25),
            ],
        },
        PatternSpec {
            id: "clear-liability-serious-injury",
            label: "clear liability + serious injury + lost wages",
            keywords: &[
                "rear-end",
                "red light",
                "stopped",
                "serious",
                "surgery",
                "lost wages",
            ],
            base_score: 80.0,
            case_strength: CaseStrength::VeryStrong,
            attorney_tier: SENIOR_PARTNER,
            practice_area: PERSONAL_INJURY,
            urgency: Urgency::High,
            multipliers: &[
                ("emergency room", 1.15),
                ("surgery", 1.4),
                ("specialist", 1.25),
                ("missed work", 1.2),
            ],
        },
        PatternSpec {
            id: "criminal-dui-first-offense",
            label: "criminal defense + first offense + dui",
            keywords: &[
                "dui",
                "first offense",
                "first time",
                "arrested",
                "criminal",
                "driving under influence",
            ],
            base_score: 75.0,
            case_strength: CaseStrength::Strong,
            attorney_tier: SENIOR_ATTORNEY,
            practice_area: CRIMINAL_DEFENSE,
            urgency: Urgency::High,
            multipliers: &[
                ("first offense", 1.3),
                ("cooperative", 1.2),
                ("no prior record", 1.25),
                ("low bac", 1.3),
            ],
        },
        PatternSpec {
            id: "rear-end-medical-minor",
            label: "rear-end + medical treatment + minor injuries",
            keywords: &["rear-end", "medical", "doctor", "back pain", "neck pain"],
            base_score: 70.0,
            case_strength: CaseStrength::Strong,
            attorney_tier: SENIOR_ATTORNEY,
            practice_area: PERSONAL_INJURY,
            urgency: Urgency::Medium,
            multipliers: &[
                ("emergency room", 1.15),
                ("specialist", 1.25),
                ("physical therapy", 1.1),
                ("missed work", 1.15),
            ],
        },
        PatternSpec {
            id: "slip-and-fall-medical",
            label: "slip and fall + medical treatment",
            keywords: &["slip", "fall", "wet floor", "medical", "doctor"],
            base_score: 65.0,
            case_strength: CaseStrength::Moderate,
            attorney_tier: ASSOCIATE_ATTORNEY,
            practice_area: PERSONAL_INJURY,
            urgency: Urgency::Medium,
            multipliers: &[
                ("emergency room", 1.2),
                ("surgery", 1.4),
                ("witness", 1.3),
                ("photos", 1.2),
            ],
        },
        PatternSpec {
            id: "criminal-misdemeanor-first-offense",
            label: "criminal defense + misdemeanor + first offense",
            keywords: &["misdemeanor", "first offense", "arrested", "criminal"],
            base_score: 60.0,
            case_strength: CaseStrength::Moderate,
            attorney_tier: ASSOCIATE_ATTORNEY,
            practice_area: CRIMINAL_DEFENSE,
            urgency: Urgency::Medium,
            multipliers: &[("first offense", 1.2), ("cooperative", 1.1)],
        },
        PatternSpec {
            id: "drug-possession",
            label: "drug crime + possession",
            keywords: &["drug", "possession", "marijuana", "controlled substance"],
            base_score: 60.0,
            case_strength: CaseStrength::Moderate,
            attorney_tier: ASSOCIATE_ATTORNEY,
            practice_area: CRIMINAL_DEFENSE,
            urgency: Urgency::Medium,
            multipliers: &[
                ("small amount", 1.2),
                ("first offense", 1.3),
                ("medical", 1.4),
            ],
        },
        PatternSpec {
            id: "criminal-dui-repeat-offense",
            label: "criminal defense + repeat dui",
            keywords: &["dui", "second offense", "repeat", "prior"],
            base_score: 45.0,
            case_strength: CaseStrength::Weak,
            attorney_tier: ASSOCIATE_ATTORNEY,
            practice_area: CRIMINAL_DEFENSE,
            urgency: Urgency::Medium,
            multipliers: &[("cooperative", 1.1)],
        },
        PatternSpec {
            id: "minor-collision-property-damage",
            label: "minor collision + no injuries + property damage only",
            keywords: &["minor", "fender bender", "no injuries", "property damage"],
            base_score: 25.0,
            case_strength: CaseStrength::Weak,
            attorney_tier: JUNIOR_ATTORNEY,
            practice_area: PERSONAL_INJURY,
            urgency: Urgency::Low,
            multipliers: &[],
        },
        PatternSpec {
            id: "general-inquiry",
            label: "general inquiry + no specific case",
            keywords: &["hello", "hi", "help", "question"],
            base_score: 20.0,
            case_strength: CaseStrength::VeryWeak,
            attorney_tier: JUNIOR_ATTORNEY,
            practice_area: GENERAL,
            urgency: Urgency::Low,
            multipliers: &[],
        },
    ];

    specs.iter().map(PatternSpec::build).collect()
}

fn tier(
    name: &str,
    min_score: u8,
    max_score: u8,
    specialties: &[&str],
    availability: AvailabilityClass,
) -> AttorneyTier {
    AttorneyTier {
        name: name.to_string(),
        min_score,
        max_score,
        specialties: strings(specialties),
        availability,
    }
}

fn tiers() -> Vec<AttorneyTier> {
    vec![
        tier(
            JUNIOR_ATTORNEY,
            0,
            44,
            &["general", "property-damage"],
            AvailabilityClass::Standard,
        ),
        tier(
            ASSOCIATE_ATTORNEY,
            45,
            64,
            &["personal-injury", "criminal-defense", "family-law"],
            AvailabilityClass::Standard,
        ),
        tier(
            SENIOR_ATTORNEY,
            65,
            79,
            &["personal-injury", "criminal-defense", "complex-cases"],
            AvailabilityClass::High,
        ),
        tier(
            SENIOR_PARTNER,
            80,
            100,
            &[
                "high-value-cases",
                "complex-litigation",
                "settlement-negotiation",
            ],
            AvailabilityClass::Premium,
        ),
    ]
}

fn urgency_levels() -> Vec<UrgencyLevel> {
    [
        (Urgency::Low, 0, 1, "24 hours", false),
        (Urgency::Medium, 65, 2, "4 hours", false),
        (Urgency::High, 80, 3, "1 hour", true),
    ]
    .into_iter()
    .map(|(level, threshold, priority, response_time, escalation)| UrgencyLevel {
        level,
        threshold,
        priority,
        response_time: response_time.to_string(),
        escalation,
    })
    .collect()
}

fn priority_levels() -> Vec<PriorityLevel> {
    [
        ("HIGH VALUE", 80, "immediate"),
        ("MEDIUM", 60, "schedule"),
        ("STANDARD", 40, "monitor"),
        ("LOW", 0, "gather"),
    ]
    .into_iter()
    .map(|(name, min_score, action)| PriorityLevel {
        name: name.to_string(),
        min_score,
        action: action.to_string(),
    })
    .collect()
}

fn actions() -> BTreeMap<String, String> {
    [
        ("immediate", "Route to senior attorney immediately"),
        ("schedule", "Schedule consultation within 24 hours"),
        ("monitor", "Continue qualification and monitoring"),
        ("gather", "Gather more information"),
    ]
    .into_iter()
    .map(|(key, text)| (key.to_string(), text.to_string()))
    .collect()
}

fn revenue_ranges() -> BTreeMap<u8, String> {
    [
        (95, "$100k-$500k+"),
        (85, "$75k-$200k"),
        (75, "$50k-$150k"),
        (65, "$25k-$100k"),
        (55, "$15k-$75k"),
        (45, "$10k-$50k"),
        (35, "$5k-$25k"),
        (25, "$2k-$15k"),
        (15, "$1k-$10k"),
    ]
    .into_iter()
    .map(|(score, range)| (score, range.to_string()))
    .collect()
}

fn template_set(initial: &str, follow_up: &str, consultation: &str) -> TemplateSet {
    TemplateSet {
        initial: Some(initial.to_string()),
        follow_up: Some(follow_up.to_string()),
        consultation: Some(consultation.to_string()),
    }
}

fn response_templates() -> ResponseTemplates {
    let mut by_pattern = BTreeMap::new();
    by_pattern.insert(
        "dui-collision-medical".to_string(),
        template_set(
            "I'm very sorry this happened. A drunk driver rear-ending you with medical treatment is exactly the type of case that results in significant settlements.",
            "With the treatment you've described, you have a very strong case. Cases like this often settle for six figures.",
            "Our {attorney} needs to meet with you immediately for a case this valuable.",
        ),
    );
    by_pattern.insert(
        "rear-end-medical-minor".to_string(),
        template_set(
            "I'm sorry about your accident. Rear-end collisions with medical treatment typically result in good settlements.",
            "With the treatment you've described, you have a {assessment} case. The other driver's insurance will likely be liable.",
            "Let's get you scheduled with our {attorney}, who handles these cases.",
        ),
    );
    by_pattern.insert(
        "criminal-dui-first-offense".to_string(),
        template_set(
            "I understand this is a difficult situation. First-time DUI cases often have good outcomes with proper representation.",
            "As a first offense, we can likely negotiate for reduced charges or diversion programs.",
            "Our {attorney} needs to meet with you quickly to protect your rights.",
        ),
    );

    ResponseTemplates {
        default: template_set(
            "I'm sorry to hear about your situation. Let me help assess your case.",
            "Based on what you've shared, your case looks {assessment}.",
            "I'd like to connect you with our {attorney} to discuss your options.",
        ),
        by_pattern,
    }
}

pub(super) fn catalog() -> CatalogConfig {
    CatalogConfig {
        version: "2024.1".to_string(),
        fallback_pattern: "general-inquiry".to_string(),
        practice_areas: [
            (PERSONAL_INJURY, true),
            (CRIMINAL_DEFENSE, true),
            ("family_law", false),
            ("business_law", false),
            (GENERAL, true),
        ]
        .into_iter()
        .map(|(id, enabled)| PracticeArea {
            id: id.to_string(),
            enabled,
        })
        .collect(),
        patterns: patterns(),
        tiers: tiers(),
        urgency_levels: urgency_levels(),
        penalties: factors(&[
            ("no injuries", 0.5),
            ("minor damage", 0.7),
            ("repeat offense", 0.6),
            ("uncooperative", 0.8),
        ]),
        consistency: ConsistencyConfig::default(),
        priority_levels: priority_levels(),
        actions: actions(),
        revenue_ranges: revenue_ranges(),
        response_templates: response_templates(),
    }
}

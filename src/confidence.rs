//! Draft confidence scoring.
//!
//! A single scalar in [0, 1] per draft: the mean of per-fact contributions
//! minus a penalty per missing field. Contributions are capped at 1.0, so
//! adding a confirmed fact can never lower the score and downgrading a
//! confirmed fact to ambiguous can never raise it.

use crate::extraction::{ExtractedFact, FactStatus};

// ═══════════════════════════════════════════════════════════
// Thresholds
// ═══════════════════════════════════════════════════════════

pub mod thresholds {
    /// Below this a report should not leave the building without review.
    pub const LOW: f32 = 0.5;
    /// Acceptable with spot checks.
    pub const MODERATE: f32 = 0.7;
    /// Routine sign-off.
    pub const HIGH: f32 = 0.85;
}

const CONFIRMED_WEIGHT: f32 = 1.0;
const AMBIGUOUS_WEIGHT: f32 = 0.4;
const MISSING_PENALTY: f32 = 0.1;
/// Small reward when the transcript repeats a value consistently.
const REPEAT_BONUS: f32 = 0.05;

// ═══════════════════════════════════════════════════════════
// Scoring
// ═══════════════════════════════════════════════════════════

/// Scores a draft's fact set.
pub fn score_draft(facts: &[ExtractedFact]) -> f32 {
    let mut sum = 0.0f32;
    let mut counted = 0u32;
    let mut missing = 0u32;

    for fact in facts {
        match fact.status {
            FactStatus::Missing => missing += 1,
            FactStatus::Confirmed => {
                sum += contribution(CONFIRMED_WEIGHT, fact);
                counted += 1;
            }
            FactStatus::Ambiguous => {
                sum += contribution(AMBIGUOUS_WEIGHT, fact);
                counted += 1;
            }
        }
    }

    let mean = if counted == 0 { 0.0 } else { sum / counted as f32 };
    (mean - MISSING_PENALTY * missing as f32).clamp(0.0, 1.0)
}

fn contribution(weight: f32, fact: &ExtractedFact) -> f32 {
    if fact.mentions > 1 {
        (weight + REPEAT_BONUS).min(1.0)
    } else {
        weight
    }
}

/// Human-readable cautions for a scored draft.
pub fn confidence_warnings(score: f32, facts: &[ExtractedFact]) -> Vec<String> {
    let mut warnings = Vec::new();
    if score < thresholds::LOW {
        warnings.push("lage betrouwbaarheid, volledige controle nodig".to_string());
    } else if score < thresholds::MODERATE {
        warnings.push("matige betrouwbaarheid, controleer gemarkeerde velden".to_string());
    }
    let missing = facts.iter().filter(|f| f.status == FactStatus::Missing).count();
    if missing > 0 {
        warnings.push(format!("{missing} verwachte velden niet gedicteerd"));
    }
    let ambiguous = facts.iter().filter(|f| f.status == FactStatus::Ambiguous).count();
    if ambiguous > 0 {
        warnings.push(format!("{ambiguous} velden onzeker"));
    }
    warnings
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{CertaintyMarker, FactValue};
    use crate::transcript::SourceSpan;

    fn fact(status: FactStatus, mentions: u32) -> ExtractedFact {
        ExtractedFact {
            field_name: "veld".to_string(),
            value: FactValue::text("waarde"),
            span: Some(SourceSpan::new(0, 6)),
            certainty: CertaintyMarker::Explicit,
            status,
            note: None,
            mentions,
        }
    }

    #[test]
    fn all_confirmed_scores_one() {
        let facts = vec![fact(FactStatus::Confirmed, 1), fact(FactStatus::Confirmed, 1)];
        assert!((score_draft(&facts) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_draft_scores_zero() {
        assert_eq!(score_draft(&[]), 0.0);
    }

    #[test]
    fn missing_fields_subtract() {
        let facts = vec![fact(FactStatus::Confirmed, 1), fact(FactStatus::Missing, 0)];
        let score = score_draft(&facts);
        assert!((score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn adding_a_confirmed_fact_never_lowers_the_score() {
        let mut facts = vec![
            fact(FactStatus::Ambiguous, 1),
            fact(FactStatus::Confirmed, 1),
            fact(FactStatus::Missing, 0),
        ];
        let before = score_draft(&facts);
        facts.push(fact(FactStatus::Confirmed, 1));
        assert!(score_draft(&facts) >= before);
    }

    #[test]
    fn downgrading_confirmed_to_ambiguous_never_raises_the_score() {
        let mut facts = vec![
            fact(FactStatus::Confirmed, 1),
            fact(FactStatus::Confirmed, 2),
            fact(FactStatus::Missing, 0),
        ];
        let before = score_draft(&facts);
        facts[0].status = FactStatus::Ambiguous;
        assert!(score_draft(&facts) <= before);
    }

    #[test]
    fn repeated_mentions_reward_ambiguous_facts_only_slightly() {
        let once = score_draft(&[fact(FactStatus::Ambiguous, 1)]);
        let twice = score_draft(&[fact(FactStatus::Ambiguous, 2)]);
        assert!(twice > once);
        assert!(twice <= once + REPEAT_BONUS + 1e-6);
    }

    #[test]
    fn score_is_clamped() {
        let facts = vec![
            fact(FactStatus::Missing, 0),
            fact(FactStatus::Missing, 0),
            fact(FactStatus::Missing, 0),
        ];
        assert_eq!(score_draft(&facts), 0.0);
    }

    #[test]
    fn warnings_reflect_draft_quality() {
        let facts = vec![fact(FactStatus::Ambiguous, 1), fact(FactStatus::Missing, 0)];
        let score = score_draft(&facts);
        let warnings = confidence_warnings(score, &facts);
        assert!(warnings.iter().any(|w| w.contains("betrouwbaarheid")));
        assert!(warnings.iter().any(|w| w.contains("niet gedicteerd")));
        assert!(warnings.iter().any(|w| w.contains("onzeker")));
    }
}

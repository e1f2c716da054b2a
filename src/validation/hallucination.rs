//! Local span verification.
//!
//! Runs before every critique round: each confirmed fact must cite a span
//! that resolves in the transcript and whose text still matches the value.
//! Unverifiable facts are downgraded on the spot, never silently kept; only
//! a span pointing outside the transcript altogether is treated as a broken
//! internal invariant.

use crate::extraction::{CertaintyMarker, ExtractedFact, FactStatus, FactValue};

use super::ValidationError;

/// Summary of one verification pass.
#[derive(Debug, Default)]
pub struct SpanVerification {
    /// Field names downgraded in this pass.
    pub downgraded: Vec<String>,
}

impl SpanVerification {
    pub fn is_clean(&self) -> bool {
        self.downgraded.is_empty()
    }
}

/// Verifies every confirmed fact against the transcript, downgrading those
/// that cannot be grounded.
pub fn verify_spans(
    facts: &mut [ExtractedFact],
    transcript_text: &str,
) -> Result<SpanVerification, ValidationError> {
    let mut result = SpanVerification::default();

    for fact in facts.iter_mut() {
        if fact.status != FactStatus::Confirmed {
            continue;
        }
        // An inference is never a finding, whatever its status claims.
        if fact.certainty == CertaintyMarker::InferredDisallowed {
            fact.downgrade("afgeleide waarde, niet gedicteerd");
            result.downgraded.push(fact.field_name.clone());
            continue;
        }
        let Some(span) = fact.span else {
            tracing::warn!(field = %fact.field_name, "confirmed fact without source span");
            fact.downgrade("bronverwijzing ontbreekt");
            result.downgraded.push(fact.field_name.clone());
            continue;
        };
        if span.end > transcript_text.len() {
            return Err(ValidationError::SpanOutOfBounds {
                field: fact.field_name.clone(),
                start: span.start,
                end: span.end,
            });
        }
        let Some(cited) = span.slice(transcript_text) else {
            fact.downgrade("bronverwijzing niet leesbaar");
            result.downgraded.push(fact.field_name.clone());
            continue;
        };
        if !value_matches(&fact.value, cited) {
            tracing::warn!(
                field = %fact.field_name,
                cited,
                "span text no longer supports the fact value"
            );
            fact.downgrade("bronverwijzing komt niet overeen met de waarde");
            result.downgraded.push(fact.field_name.clone());
        }
    }

    Ok(result)
}

/// The cited text must contain the value's literal token: the number for
/// numeric facts, the phrase for textual ones.
fn value_matches(value: &FactValue, cited: &str) -> bool {
    let cited = cited.to_lowercase();
    match value {
        FactValue::Numeric { value, .. } => {
            let whole = if value.fract() == 0.0 {
                format!("{}", *value as i64)
            } else {
                format!("{value}")
            };
            cited.contains(&whole) || cited.replace(',', ".").contains(&whole)
        }
        FactValue::Text { text } => cited.contains(&text.to_lowercase()),
        FactValue::Choice { choice } => cited.contains(&choice.to_lowercase()),
        FactValue::Flag { .. } => true,
        FactValue::Empty => false,
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

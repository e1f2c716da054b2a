//! Template resolution: classify the investigation, then bind extracted
//! candidates into the template's fixed field order.

use crate::extraction::{ExtractedFact, FactStatus, FactValue};

use super::catalog::{template_for, FieldKind, InvestigationTemplate, InvestigationType};
use super::TemplateError;

// ═══════════════════════════════════════════════════════════
// Classification
// ═══════════════════════════════════════════════════════════

/// Picks the investigation template for a dictation.
///
/// An explicit override always wins. Otherwise trigger phrases are counted
/// on the lowercased text; no hit or a tie between the best two candidates
/// falls back to `Generic` rather than guessing.
pub fn classify_investigation(
    text: &str,
    override_type: Option<InvestigationType>,
) -> InvestigationType {
    if let Some(inv) = override_type {
        tracing::debug!(investigation = inv.as_str(), "template override applied");
        return inv;
    }
    match detect(text) {
        Ok(inv) => {
            tracing::debug!(investigation = inv.as_str(), "investigation classified");
            inv
        }
        Err(err @ TemplateError::NoMatch) => {
            tracing::warn!(error = %err, "falling back to generic template");
            InvestigationType::Generic
        }
    }
}

fn detect(text: &str) -> Result<InvestigationType, TemplateError> {
    let lowered = text.to_lowercase();
    let mut scores: Vec<(InvestigationType, usize)> = super::catalog::catalog()
        .iter()
        .filter(|t| !t.keywords.is_empty())
        .map(|t| {
            let hits = t.keywords.iter().filter(|k| lowered.contains(*k)).count();
            (t.investigation, hits)
        })
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let Some(&(best, top)) = scores.first() else {
        return Err(TemplateError::NoMatch);
    };
    if top == 0 {
        return Err(TemplateError::NoMatch);
    }
    if scores.get(1).is_some_and(|&(_, second)| second == top) {
        tracing::debug!(score = top, "classification tie between investigations");
        return Err(TemplateError::NoMatch);
    }
    Ok(best)
}

// ═══════════════════════════════════════════════════════════
// Binding
// ═══════════════════════════════════════════════════════════

/// Binds candidates to the template's fields, in template order.
///
/// Multiple mentions of the same field resolve to the latest one in the
/// dictation (corrections supersede earlier values). Required fields without
/// any candidate become explicit `Missing` facts; optional absent fields are
/// simply not reported. Numeric values outside the plausible range are kept
/// but downgraded.
pub fn bind_fields(
    template: &InvestigationTemplate,
    candidates: Vec<ExtractedFact>,
) -> Vec<ExtractedFact> {
    let mut bound = Vec::with_capacity(template.fields().len());

    for field in template.fields() {
        let mut matching: Vec<ExtractedFact> = candidates
            .iter()
            .filter(|c| c.field_name == field.name)
            .cloned()
            .collect();

        if matching.is_empty() {
            if field.required {
                bound.push(ExtractedFact::missing(field.name));
            }
            continue;
        }

        let mentions = matching.len() as u32;
        matching.sort_by_key(|c| c.span.map_or(0, |s| s.start));
        let mut fact = match matching.pop() {
            Some(f) => f,
            None => continue,
        };
        fact.mentions = mentions;
        if mentions > 1 {
            tracing::debug!(
                field = field.name,
                mentions,
                "multiple mentions, latest wins"
            );
        }

        if field.kind == FieldKind::Numeric {
            if let (FactValue::Numeric { value, .. }, Some((lo, hi))) =
                (&fact.value, field.valid_range)
            {
                if *value < lo || *value > hi {
                    fact.downgrade(&format!("buiten verwacht bereik {lo}\u{2013}{hi}"));
                }
            }
        }
        bound.push(fact);
    }

    bound
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::SourceSpan;

    fn candidate(field: &str, value: FactValue, start: usize) -> ExtractedFact {
        ExtractedFact {
            field_name: field.to_string(),
            value,
            span: Some(SourceSpan::new(start, start + 3)),
            certainty: crate::extraction::CertaintyMarker::Explicit,
            status: FactStatus::Confirmed,
            note: None,
            mentions: 1,
        }
    }

    #[test]
    fn classifies_ecg_dictation() {
        let inv = classify_investigation(
            "ECG toont sinusritme met frequentie van 75 per minuut. PR interval 160 ms.",
            None,
        );
        assert_eq!(inv, InvestigationType::Ecg);
    }

    #[test]
    fn classifies_exercise_test() {
        let inv = classify_investigation("Fietsproef tot 150 watt, gestopt wegens vermoeidheid.", None);
        assert_eq!(inv, InvestigationType::ExerciseTest);
    }

    #[test]
    fn unrecognized_dictation_falls_back_to_generic() {
        let inv = classify_investigation("Algemene controle, niets bijzonders.", None);
        assert_eq!(inv, InvestigationType::Generic);
    }

    #[test]
    fn override_beats_keywords() {
        let inv = classify_investigation(
            "ECG toont sinusritme.",
            Some(InvestigationType::Holter),
        );
        assert_eq!(inv, InvestigationType::Holter);
    }

    #[test]
    fn required_fields_without_candidates_become_missing() {
        let template = template_for(InvestigationType::Ecg);
        let bound = bind_fields(template, vec![]);
        assert_eq!(bound.len(), 6);
        assert!(bound.iter().all(|f| f.status == FactStatus::Missing));
    }

    #[test]
    fn binding_preserves_template_order() {
        let template = template_for(InvestigationType::Ecg);
        let bound = bind_fields(
            template,
            vec![
                candidate("qtc", FactValue::numeric(420.0, Some("ms")), 50),
                candidate("rhythm", FactValue::choice("sinusritme"), 10),
            ],
        );
        let names: Vec<_> = bound.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["rhythm", "rate", "pr", "qrs", "repolarisation", "qtc"]);
    }

    #[test]
    fn latest_mention_wins_and_mentions_counted() {
        let template = template_for(InvestigationType::Ecg);
        let bound = bind_fields(
            template,
            vec![
                candidate("rate", FactValue::numeric(80.0, Some("/min")), 10),
                candidate("rate", FactValue::numeric(75.0, Some("/min")), 40),
            ],
        );
        let rate = bound.iter().find(|f| f.field_name == "rate").unwrap();
        assert_eq!(rate.value, FactValue::numeric(75.0, Some("/min")));
        assert_eq!(rate.mentions, 2);
    }

    #[test]
    fn out_of_range_numeric_is_downgraded_not_dropped() {
        let template = template_for(InvestigationType::Ecg);
        let bound = bind_fields(
            template,
            vec![candidate("qtc", FactValue::numeric(700.0, Some("ms")), 10)],
        );
        let qtc = bound.iter().find(|f| f.field_name == "qtc").unwrap();
        assert_eq!(qtc.status, FactStatus::Ambiguous);
        assert!(qtc.note.as_deref().unwrap().contains("bereik"));
        assert_eq!(qtc.value, FactValue::numeric(700.0, Some("ms")));
    }

    #[test]
    fn optional_absent_fields_are_omitted() {
        let template = template_for(InvestigationType::Holter);
        let bound = bind_fields(
            template,
            vec![
                candidate("duration", FactValue::numeric(24.0, Some("uur")), 5),
                candidate("avg_rate", FactValue::numeric(72.0, Some("/min")), 30),
            ],
        );
        // Required: duration + avg_rate; optional absentees do not appear.
        assert_eq!(bound.len(), 2);
    }
}

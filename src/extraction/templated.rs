//! Template-driven field extraction.
//!
//! Runs every field pattern of the resolved template over every statement
//! and emits grounded candidates. Binding (latest-wins, missing markers,
//! range checks) happens afterwards in the template resolver.

use crate::template::{FieldKind, FieldSpec, InvestigationTemplate};
use crate::transcript::{SourceSpan, Transcript};

use super::certainty::statement_certainty;
use super::types::{CertaintyMarker, ExtractedFact, FactValue};

/// Extracts all field candidates for a template, in dictation order.
pub fn extract_template_fields(
    transcript: &Transcript,
    template: &InvestigationTemplate,
) -> Vec<ExtractedFact> {
    let text = transcript.text();
    let mut candidates = Vec::new();

    for statement in transcript.statements() {
        let stext = statement.text(text);
        let hedged = statement_certainty(stext) == CertaintyMarker::Hedge;

        for field in template.fields() {
            for caps in field.pattern().captures_iter(stext) {
                // Patterns with alternations use a second value group.
                let Some(m) = caps.name("val").or_else(|| caps.name("val2")) else {
                    continue;
                };
                let span = SourceSpan::new(statement.start + m.start(), statement.start + m.end());
                let Some(value) = typed_value(field, m.as_str(), &caps) else {
                    continue;
                };
                match ExtractedFact::grounded(field.name, value, span, text) {
                    Ok(mut fact) => {
                        if hedged {
                            fact.mark_hedged();
                        }
                        if field.kind == FieldKind::Numeric
                            && field.unit.is_some()
                            && caps.name("unit").is_none()
                        {
                            fact.downgrade("eenheid niet vermeld");
                        }
                        candidates.push(fact);
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "discarding ungroundable candidate");
                    }
                }
            }
        }
    }

    tracing::debug!(
        investigation = template.investigation.as_str(),
        candidates = candidates.len(),
        "template fields extracted"
    );
    candidates
}

/// Converts the raw capture into the field's typed value. Numeric parses use
/// the decimal comma tolerated in dictation; unparseable numbers drop the
/// candidate.
fn typed_value(field: &FieldSpec, raw: &str, caps: &regex::Captures<'_>) -> Option<FactValue> {
    match field.kind {
        FieldKind::Numeric => {
            let value: f64 = raw.replace(',', ".").parse().ok()?;
            let unit = caps.name("unit").and_then(|_| field.unit);
            Some(FactValue::numeric(value, unit))
        }
        FieldKind::Choice => Some(FactValue::choice(raw.to_lowercase())),
        FieldKind::Text => Some(FactValue::text(raw.trim().to_lowercase())),
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

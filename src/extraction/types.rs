//! Extracted fact model.
//!
//! A fact is only ever `Confirmed` when it carries a span that resolves to
//! real transcript text. Everything the extractor could not ground is either
//! `Ambiguous` (present but uncertain) or `Missing` (expected but absent).

use serde::{Deserialize, Serialize};

use crate::transcript::SourceSpan;

use super::ExtractionError;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Certainty of the source statement a fact was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertaintyMarker {
    /// Stated outright, no hedging.
    Explicit,
    /// Hedged wording ("mogelijk", "waarschijnlijk", ...).
    Hedge,
    /// Would require inference beyond the transcript; never reported as fact.
    InferredDisallowed,
}

/// Lifecycle status of a fact within a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactStatus {
    Confirmed,
    Missing,
    Ambiguous,
}

impl FactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactStatus::Confirmed => "confirmed",
            FactStatus::Missing => "missing",
            FactStatus::Ambiguous => "ambiguous",
        }
    }
}

/// Typed value of an extracted fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactValue {
    Text { text: String },
    Numeric { value: f64, unit: Option<String> },
    Choice { choice: String },
    Flag { set: bool },
    /// Placeholder for missing fields; renders as the missing-value marker.
    Empty,
}

impl FactValue {
    pub fn text(s: impl Into<String>) -> FactValue {
        FactValue::Text { text: s.into() }
    }

    pub fn choice(s: impl Into<String>) -> FactValue {
        FactValue::Choice { choice: s.into() }
    }

    pub fn numeric(value: f64, unit: Option<&str>) -> FactValue {
        FactValue::Numeric {
            value,
            unit: unit.map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FactValue::Empty)
    }

    /// Report rendering: numbers keep their unit, units that start with `/`
    /// attach without a space ("75/min" vs "160 ms").
    pub fn render(&self) -> String {
        match self {
            FactValue::Text { text } => text.clone(),
            FactValue::Choice { choice } => choice.clone(),
            FactValue::Numeric { value, unit } => {
                let number = if value.fract() == 0.0 {
                    format!("{}", *value as i64)
                } else {
                    format!("{value}")
                };
                match unit.as_deref() {
                    Some(u) if u.starts_with('/') => format!("{number}{u}"),
                    Some(u) => format!("{number} {u}"),
                    None => number,
                }
            }
            FactValue::Flag { set } => if *set { "ja" } else { "nee" }.to_string(),
            FactValue::Empty => String::new(),
        }
    }
}

/// One field-level finding, grounded in the transcript through its span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub field_name: String,
    pub value: FactValue,
    pub span: Option<SourceSpan>,
    pub certainty: CertaintyMarker,
    pub status: FactStatus,
    /// Qualifying annotation carried into the report ("buiten verwacht
    /// bereik", validator feedback, ...).
    pub note: Option<String>,
    /// How many times the transcript mentioned this field.
    #[serde(default = "one")]
    pub mentions: u32,
}

fn one() -> u32 {
    1
}

impl ExtractedFact {
    /// Builds a confirmed fact, verifying that the span actually resolves to
    /// text in the transcript.
    pub fn grounded(
        field_name: &str,
        value: FactValue,
        span: SourceSpan,
        transcript_text: &str,
    ) -> Result<ExtractedFact, ExtractionError> {
        if span.slice(transcript_text).is_none() {
            return Err(ExtractionError::MalformedSpan {
                field: field_name.to_string(),
                start: span.start,
                end: span.end,
            });
        }
        Ok(ExtractedFact {
            field_name: field_name.to_string(),
            value,
            span: Some(span),
            certainty: CertaintyMarker::Explicit,
            status: FactStatus::Confirmed,
            note: None,
            mentions: 1,
        })
    }

    /// A required field the transcript never mentioned.
    pub fn missing(field_name: &str) -> ExtractedFact {
        ExtractedFact {
            field_name: field_name.to_string(),
            value: FactValue::Empty,
            span: None,
            certainty: CertaintyMarker::Explicit,
            status: FactStatus::Missing,
            note: None,
            mentions: 0,
        }
    }

    /// Downgrades to `Ambiguous`, appending the reason to the note.
    pub fn downgrade(&mut self, reason: &str) {
        self.status = FactStatus::Ambiguous;
        self.append_note(reason);
    }

    pub fn append_note(&mut self, addition: &str) {
        match &mut self.note {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(addition);
            }
            None => self.note = Some(addition.to_string()),
        }
    }

    /// Applies the hedged-statement policy: hedged wording can never yield a
    /// confirmed fact.
    pub fn mark_hedged(&mut self) {
        self.certainty = CertaintyMarker::Hedge;
        if self.status == FactStatus::Confirmed {
            self.status = FactStatus::Ambiguous;
        }
        if self.note.is_none() {
            self.note = Some("afgezwakte formulering".to_string());
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

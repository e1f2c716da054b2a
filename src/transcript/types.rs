//! Span-indexed transcript model.
//!
//! The transcript text is immutable after segmentation; every downstream fact
//! points back into it through byte offsets, so the offsets stay valid for the
//! whole lifetime of a job.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Who uttered a statement, derived from explicit turn markers
/// (`Dokter:` / `Arts:` / `Patiënt:`) in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Clinician,
    Patient,
    Unknown,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Clinician => "clinician",
            Speaker::Patient => "patient",
            Speaker::Unknown => "unknown",
        }
    }

    /// Maps a matched turn-marker word to a speaker.
    pub(crate) fn from_marker(marker: &str) -> Speaker {
        match marker.to_lowercase().as_str() {
            "dokter" | "arts" => Speaker::Clinician,
            "patiënt" | "patient" => Speaker::Patient,
            _ => Speaker::Unknown,
        }
    }
}

/// Half-open byte range `[start, end)` into the transcript text.
///
/// Spans are the grounding mechanism: a fact without a resolvable span is
/// never reported as confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> SourceSpan {
        SourceSpan { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Resolves the span against the transcript text.
    ///
    /// Returns `None` when the range is empty, out of bounds, or does not
    /// fall on character boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.is_empty() {
            return None;
        }
        text.get(self.start..self.end)
    }
}

/// One dictated statement: a sentence-level unit with an inherited speaker.
///
/// Statements tile the transcript without gaps, so `start..end` of
/// consecutive statements are adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub speaker: Speaker,
    pub start: usize,
    pub end: usize,
}

impl Statement {
    pub fn text<'a>(&self, transcript_text: &'a str) -> &'a str {
        &transcript_text[self.start..self.end]
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::new(self.start, self.end)
    }
}

/// The immutable segmented transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    text: String,
    statements: Vec<Statement>,
}

impl Transcript {
    pub(crate) fn new(text: String, statements: Vec<Statement>) -> Transcript {
        Transcript { text, statements }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_slices_within_bounds() {
        let text = "pijn op de borst";
        let span = SourceSpan::new(0, 4);
        assert_eq!(span.slice(text), Some("pijn"));
    }

    #[test]
    fn span_out_of_bounds_is_none() {
        let span = SourceSpan::new(10, 50);
        assert_eq!(span.slice("kort"), None);
    }

    #[test]
    fn empty_span_is_none() {
        let span = SourceSpan::new(3, 3);
        assert_eq!(span.slice("abcdef"), None);
        assert!(span.is_empty());
    }

    #[test]
    fn span_off_char_boundary_is_none() {
        // "ë" is two bytes; 5..7 starts mid-character.
        let text = "Pati\u{eb}nt";
        let span = SourceSpan::new(5, 7);
        assert_eq!(span.slice(text), None);
    }

    #[test]
    fn speaker_from_marker_words() {
        assert_eq!(Speaker::from_marker("Dokter"), Speaker::Clinician);
        assert_eq!(Speaker::from_marker("arts"), Speaker::Clinician);
        assert_eq!(Speaker::from_marker("Pati\u{eb}nt"), Speaker::Patient);
        assert_eq!(Speaker::from_marker("patient"), Speaker::Patient);
    }

    #[test]
    fn speaker_serializes_snake_case() {
        let json = serde_json::to_string(&Speaker::Clinician).unwrap();
        assert_eq!(json, "\"clinician\"");
    }
}

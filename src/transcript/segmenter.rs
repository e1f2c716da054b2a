//! Statement segmenter.
//!
//! Splits raw dictation into speaker turns (explicit `Dokter:` / `Arts:` /
//! `Patiënt:` markers) and then into sentence-level statements. The produced
//! statements tile the transcript exactly: no byte is lost and no byte is
//! claimed twice, so every downstream span stays resolvable.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Speaker, Statement, Transcript};
use super::SegmentationError;

// ═══════════════════════════════════════════════════════════
// Turn markers
// ═══════════════════════════════════════════════════════════

static TURN_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(dokter|arts|pati\u{eb}nt|patient)\s*:").unwrap());

/// Dutch clinical abbreviations whose trailing period is not a sentence end.
const ABBREVIATIONS: &[&str] = &[
    "dr.", "mevr.", "dhr.", "bijv.", "o.a.", "ca.", "evt.", "t.h.v.", "i.v.m.", "wo.",
];

// ═══════════════════════════════════════════════════════════
// Segmentation
// ═══════════════════════════════════════════════════════════

/// Segments raw text into a span-indexed transcript.
///
/// Fails only on empty input; any non-empty text yields at least one
/// statement.
pub fn segment(text: &str) -> Result<Transcript, SegmentationError> {
    if text.trim().is_empty() {
        return Err(SegmentationError::EmptyTranscript);
    }

    // Turn boundaries: each marker starts a turn, text before the first
    // marker (or all text when there are none) belongs to Unknown.
    let mut turns: Vec<(usize, Speaker)> = Vec::new();
    if TURN_MARKER.find(text).map_or(true, |m| m.start() > 0) {
        turns.push((0, Speaker::Unknown));
    }
    for caps in TURN_MARKER.captures_iter(text) {
        let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        turns.push((whole.start(), Speaker::from_marker(word.as_str())));
    }

    // A whitespace-only prefix before the first marker would become a blank
    // statement; fold it into the first real turn instead.
    if turns.len() > 1 && text[turns[0].0..turns[1].0].trim().is_empty() {
        let speaker = turns[1].1;
        turns.remove(0);
        turns[0] = (0, speaker);
    }

    let mut statements = Vec::new();
    for (i, &(turn_start, speaker)) in turns.iter().enumerate() {
        let turn_end = turns.get(i + 1).map_or(text.len(), |&(next, _)| next);
        for (start, end) in sentence_bounds(text, turn_start, turn_end) {
            statements.push(Statement { speaker, start, end });
        }
    }

    tracing::debug!(
        statements = statements.len(),
        turns = turns.len(),
        "transcript segmented"
    );
    Ok(Transcript::new(text.to_string(), statements))
}

/// Sentence boundaries within `text[start..end]`, as absolute byte ranges.
///
/// A boundary sits after the terminator's trailing whitespace run, so the
/// whitespace belongs to the preceding statement and the ranges tile the
/// region exactly.
fn sentence_bounds(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let slice = &text[start..end];
    let bytes = slice.as_bytes();
    let mut bounds = Vec::new();
    let mut sent_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'.' && b != b'!' && b != b'?' {
            i += 1;
            continue;
        }
        // Periods inside numbers ("2.5") and known abbreviations do not end
        // a sentence.
        if b == b'.'
            && (ends_with_abbreviation(slice, i)
                || bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < bytes.len() && matches!(bytes[j], b'.' | b'!' | b'?') {
            j += 1;
        }
        if j < bytes.len() && !slice[j..].starts_with(char::is_whitespace) {
            // Terminator glued to a non-space character, e.g. a decimal
            // comma variant or an ellipsis inside a token.
            i = j;
            continue;
        }
        while let Some(ch) = slice[j..].chars().next() {
            if !ch.is_whitespace() {
                break;
            }
            j += ch.len_utf8();
        }
        if j >= bytes.len() {
            // Region-final terminator; the tail below closes the statement.
            break;
        }
        bounds.push((start + sent_start, start + j));
        sent_start = j;
        i = j;
    }

    if sent_start < slice.len() {
        bounds.push((start + sent_start, end));
    }
    bounds
}

fn ends_with_abbreviation(slice: &str, period_pos: usize) -> bool {
    let prefix = &slice[..=period_pos];
    ABBREVIATIONS.iter().any(|abbr| {
        // The candidate cut must land on a char boundary; a multibyte
        // character right before the period would otherwise split mid-char.
        prefix.len() >= abbr.len()
            && prefix.is_char_boundary(prefix.len() - abbr.len())
            && prefix[prefix.len() - abbr.len()..].eq_ignore_ascii_case(abbr)
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

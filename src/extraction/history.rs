//! Free-form anamnesis extraction.
//!
//! Mines doctor-patient conversation for complaints and their qualifiers.
//! Every emitted fact carries a span into the transcript; clinician turns
//! are skipped because their questions mention symptoms the patient may not
//! have ("Heeft u pijn?" is not a complaint).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::transcript::{Speaker, SourceSpan, Transcript};

use super::certainty::statement_certainty;
use super::types::{CertaintyMarker, ExtractedFact, FactStatus, FactValue};

// ═══════════════════════════════════════════════════════════
// Field names
// ═══════════════════════════════════════════════════════════

pub const FIELD_REASON: &str = "reason_for_encounter";
pub const FIELD_COMPLAINT: &str = "complaint";
pub const FIELD_ONSET: &str = "onset";
pub const FIELD_CHARACTER: &str = "character";
pub const FIELD_LOCATION: &str = "location";
pub const FIELD_SEVERITY: &str = "severity";
pub const FIELD_AGGRAVATING: &str = "aggravating_factor";
pub const FIELD_RELIEVING: &str = "relieving_factor";
pub const FIELD_HISTORY_ITEM: &str = "history_item";
pub const FIELD_RED_FLAG: &str = "red_flag";
pub const FIELD_INFO_GAP: &str = "information_gap";

/// Detail fields that attach to the most recent complaint.
pub const DETAIL_FIELDS: &[&str] = &[
    FIELD_ONSET,
    FIELD_CHARACTER,
    FIELD_LOCATION,
    FIELD_SEVERITY,
    FIELD_AGGRAVATING,
    FIELD_RELIEVING,
];

// ═══════════════════════════════════════════════════════════
// Lexicon
// ═══════════════════════════════════════════════════════════

static SYMPTOM_CORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<val>pijn(?:\s+(?:op|in|aan)\s+(?:de\s+|het\s+|een\s+)?[a-z\u{e0}-\u{ff}]+)?|hoofdpijn|kortademigheid|hartkloppingen|duizeligheid|misselijkheid|vermoeidheid|zwelling|koorts|hoest|syncope)\b",
    )
    .unwrap()
});

static COMPLAINT_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:last|klachten)\s+van\s+(?P<val>[a-z\u{e0}-\u{ff}][a-z\u{e0}-\u{ff} ]{2,40}?)(?:[,.;]|$)",
    )
    .unwrap()
});

static ONSET_SINCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bsinds\s+(?P<val>gisteren|eergisteren|vandaag|vanmorgen|vanmiddag|vannacht|vorige\s+week|enkele\s+(?:dagen|weken|maanden)|\d+\s+(?:dagen|weken|maanden|jaar))\b",
    )
    .unwrap()
});

static ONSET_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<val>\d+\s+(?:dagen|weken|maanden|jaar))\s+geleden\b").unwrap()
});

static CHARACTER_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<val>drukkend[e]?|stekend[e]?|brandend[e]?|scheurend[e]?|kloppend[e]?|zeurend[e]?|krampend[e]?|snijdend[e]?|bonzend[e]?)\b",
    )
    .unwrap()
});

static SEVERITY_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<val>licht|mild|matig|ernstig|hevig|ondraaglijk)\b").unwrap()
});

static LOCATION_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<val>retrosternaal|uitstralend\s+naar\s+[a-z\u{e0}-\u{ff} ]{2,20}?(?:[,.;]|$)|linkerarm|rechterarm|kaak|nek|rug)\b",
    )
    .unwrap()
});

static AGGRAVATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:erger|verergert|verergering|toenemend|vooral)\s+(?:bij|na|tijdens|met)\s+(?P<val>[a-z\u{e0}-\u{ff}]+)",
    )
    .unwrap()
});

static RELIEVING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:beter|verlicht|vermindert|afnemend)\s+(?:bij|na|met|door|in)\s+(?P<val>[a-z\u{e0}-\u{ff}]+)",
    )
    .unwrap()
});

static REASON_EXPLICIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:ik\s+(?:kom(?:\s+hier)?|ben\s+hier)\s+voor|mijn\s+klacht\s+is)\s+(?P<val>[^,.;]{3,60})",
    )
    .unwrap()
});

static HISTORY_SELF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bik\s+(?:heb|had)\s+(?:vroeger\s+|eerder\s+|vorig\s+jaar\s+)?(?:een\s+)?(?P<val>[a-z\u{e0}-\u{ff} ]{3,40}?)\s+(?:gehad|doorgemaakt|gekregen)\b",
    )
    .unwrap()
});

static HISTORY_FAMILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:mijn\s+)?(?P<rel>vader|moeder|broer|zus|familie)\s+heeft\s+(?:ook\s+|wel\s+)?(?:een\s+)?(?P<val>[a-z\u{e0}-\u{ff} ]{3,40}?)(?:\s+gehad)?(?:[,.;]|$)",
    )
    .unwrap()
});

/// Conditions that make a mentioned antecedent clinically relevant.
const RELEVANT_CONDITIONS: &[&str] = &[
    "hartaanval",
    "infarct",
    "hartinfarct",
    "operatie",
    "diabetes",
    "suikerziekte",
    "hypertensie",
    "hoge bloeddruk",
    "kanker",
    "allergie",
    "astma",
    "cva",
    "beroerte",
    "trombose",
    "embolie",
    "hartfalen",
];

static RED_FLAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<val>plotse?|acute?|ondraaglijke?|bewusteloos|flauwgevallen|hartkloppingen|kortademigheid|kortademig|bloeding|koorts|syncope|nachtelijk\s+zweten)\b",
    )
    .unwrap()
});

/// Articles dropped when condensing a complaint into the reason line.
const CONDENSE_STOPWORDS: &[&str] = &["de", "het", "een"];
const CONDENSE_MAX_WORDS: usize = 4;

// ═══════════════════════════════════════════════════════════
// Extraction
// ═══════════════════════════════════════════════════════════

/// Runs the free-form extractor over patient and unmarked statements.
///
/// The returned facts are ordered for rendering: reason first, then each
/// complaint immediately followed by its qualifiers, then antecedents,
/// alarm signals, and finally the derived information gaps.
pub fn extract_history(transcript: &Transcript) -> Vec<ExtractedFact> {
    let text = transcript.text();
    let mut facts: Vec<ExtractedFact> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    // Per-complaint record of which detail fields were found, for gap
    // reporting.
    let mut blocks: Vec<(String, HashSet<&'static str>)> = Vec::new();
    let mut explicit_reason: Option<ExtractedFact> = None;

    for statement in transcript.statements() {
        if statement.speaker == Speaker::Clinician {
            continue;
        }
        let stext = statement.text(text);
        let offset = statement.start;
        let hedged = statement_certainty(stext) == CertaintyMarker::Hedge;

        if explicit_reason.is_none() {
            if let Some(caps) = REASON_EXPLICIT.captures(stext) {
                if let Some(m) = caps.name("val") {
                    let value = condense(m.as_str().trim());
                    explicit_reason = build_fact(
                        FIELD_REASON,
                        FactValue::text(value),
                        offset + m.start(),
                        offset + m.end(),
                        text,
                        hedged,
                    );
                }
            }
        }

        // Complaints first, remembering their ranges so location words inside
        // the complaint phrase are not double-reported.
        let mut complaint_ranges: Vec<(usize, usize)> = Vec::new();
        for regex in [&*SYMPTOM_CORE, &*COMPLAINT_OF] {
            for caps in regex.captures_iter(stext) {
                let Some(m) = caps.name("val") else { continue };
                // Both complaint patterns can hit the same phrase ("last van
                // hoofdpijn"); one utterance is one mention.
                if complaint_ranges
                    .iter()
                    .any(|&(s, e)| m.start() < e && s < m.end())
                {
                    continue;
                }
                let value = m.as_str().trim().to_lowercase();
                complaint_ranges.push((m.start(), m.end()));
                if !note_first(&mut seen, &mut facts, FIELD_COMPLAINT, &value) {
                    continue;
                }
                if let Some(fact) = build_fact(
                    FIELD_COMPLAINT,
                    FactValue::text(&value),
                    offset + m.start(),
                    offset + m.end(),
                    text,
                    hedged,
                ) {
                    blocks.push((value, HashSet::new()));
                    facts.push(fact);
                }
            }
        }

        for (field, regex) in [
            (FIELD_ONSET, &*ONSET_SINCE),
            (FIELD_ONSET, &*ONSET_AGO),
            (FIELD_CHARACTER, &*CHARACTER_WORDS),
            (FIELD_SEVERITY, &*SEVERITY_WORDS),
            (FIELD_LOCATION, &*LOCATION_WORDS),
            (FIELD_AGGRAVATING, &*AGGRAVATING),
            (FIELD_RELIEVING, &*RELIEVING),
        ] {
            for caps in regex.captures_iter(stext) {
                let Some(m) = caps.name("val") else { continue };
                if field == FIELD_LOCATION
                    && complaint_ranges
                        .iter()
                        .any(|&(s, e)| m.start() >= s && m.end() <= e)
                {
                    continue;
                }
                let value = m.as_str().trim().trim_end_matches(['.', ',', ';']).to_lowercase();
                if !note_first(&mut seen, &mut facts, field, &value) {
                    continue;
                }
                if let Some(fact) = build_fact(
                    field,
                    FactValue::text(&value),
                    offset + m.start(),
                    offset + m.end(),
                    text,
                    hedged,
                ) {
                    if let Some((_, details)) = blocks.last_mut() {
                        details.insert(field);
                    }
                    facts.push(fact);
                }
            }
        }

        for caps in HISTORY_SELF.captures_iter(stext) {
            let Some(m) = caps.name("val") else { continue };
            let value = m.as_str().trim().to_lowercase();
            if !is_relevant_condition(&value) {
                continue;
            }
            if !note_first(&mut seen, &mut facts, FIELD_HISTORY_ITEM, &value) {
                continue;
            }
            if let Some(fact) = build_fact(
                FIELD_HISTORY_ITEM,
                FactValue::text(&value),
                offset + m.start(),
                offset + m.end(),
                text,
                hedged,
            ) {
                facts.push(fact);
            }
        }
        for caps in HISTORY_FAMILY.captures_iter(stext) {
            let (Some(rel), Some(m)) = (caps.name("rel"), caps.name("val")) else {
                continue;
            };
            let value = m.as_str().trim().to_lowercase();
            if !is_relevant_condition(&value) {
                continue;
            }
            if !note_first(&mut seen, &mut facts, FIELD_HISTORY_ITEM, &value) {
                continue;
            }
            if let Some(mut fact) = build_fact(
                FIELD_HISTORY_ITEM,
                FactValue::text(&value),
                offset + m.start(),
                offset + m.end(),
                text,
                hedged,
            ) {
                fact.append_note(&format!("gemeld bij {}", rel.as_str().to_lowercase()));
                facts.push(fact);
            }
        }

        for caps in RED_FLAGS.captures_iter(stext) {
            let Some(m) = caps.name("val") else { continue };
            let value = m.as_str().trim().to_lowercase();
            if !note_first(&mut seen, &mut facts, FIELD_RED_FLAG, &value) {
                continue;
            }
            if let Some(fact) = build_fact(
                FIELD_RED_FLAG,
                FactValue::text(&value),
                offset + m.start(),
                offset + m.end(),
                text,
                hedged,
            ) {
                facts.push(fact);
            }
        }
    }

    // Reason of encounter: explicit phrasing wins, otherwise condensed from
    // the first complaint.
    let reason = explicit_reason.or_else(|| {
        facts
            .iter()
            .find(|f| f.field_name == FIELD_COMPLAINT)
            .map(|complaint| {
                let mut fact = complaint.clone();
                fact.field_name = FIELD_REASON.to_string();
                fact.value = FactValue::text(condense(&complaint.value.render()));
                fact.mentions = 1;
                fact
            })
    });
    if let Some(fact) = reason {
        facts.insert(0, fact);
    }

    // Gaps are derived, not extracted: they carry no span and render under
    // "Ontbrekende informatie".
    for (complaint, details) in &blocks {
        for (field, label) in [
            (FIELD_ONSET, "Onset"),
            (FIELD_CHARACTER, "Karakter"),
            (FIELD_SEVERITY, "Ernst"),
        ] {
            if !details.contains(field) {
                let mut gap = ExtractedFact::missing(FIELD_INFO_GAP);
                gap.note = Some(format!("{label} van '{complaint}' niet vermeld"));
                facts.push(gap);
            }
        }
    }

    tracing::debug!(facts = facts.len(), complaints = blocks.len(), "anamnesis extracted");
    facts
}

/// True the first time a (field, value) pair is seen; on repeats, bumps the
/// mention counter of the existing fact instead.
fn note_first(
    seen: &mut HashSet<(String, String)>,
    facts: &mut [ExtractedFact],
    field: &str,
    value: &str,
) -> bool {
    if seen.insert((field.to_string(), value.to_string())) {
        return true;
    }
    if let Some(existing) = facts
        .iter_mut()
        .find(|f| f.field_name == field && f.value.render().eq_ignore_ascii_case(value))
    {
        existing.mentions += 1;
    }
    false
}

fn build_fact(
    field: &str,
    value: FactValue,
    start: usize,
    end: usize,
    text: &str,
    hedged: bool,
) -> Option<ExtractedFact> {
    match ExtractedFact::grounded(field, value, SourceSpan::new(start, end), text) {
        Ok(mut fact) => {
            if hedged {
                fact.mark_hedged();
            }
            Some(fact)
        }
        Err(err) => {
            tracing::debug!(error = %err, "discarding ungroundable candidate");
            None
        }
    }
}

fn is_relevant_condition(value: &str) -> bool {
    RELEVANT_CONDITIONS.iter().any(|c| value.contains(c))
}

/// Condenses a complaint phrase into a short reason line: articles dropped,
/// at most four words.
fn condense(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .filter(|w| !CONDENSE_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .take(CONDENSE_MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::segmenter::segment;

    fn facts_for(text: &str) -> Vec<ExtractedFact> {
        extract_history(&segment(text).unwrap())
    }

    fn find<'a>(facts: &'a [ExtractedFact], field: &str) -> Option<&'a ExtractedFact> {
        facts.iter().find(|f| f.field_name == field)
    }

    #[test]
    fn chest_pain_conversation_yields_grounded_qualifiers() {
        let text = "Dokter: Wat zijn uw klachten? Pati\u{eb}nt: Ik heb sinds gisteren pijn op de borst, drukkend, erger bij inspanning.";
        let facts = facts_for(text);

        let complaint = find(&facts, FIELD_COMPLAINT).unwrap();
        assert_eq!(complaint.value.render(), "pijn op de borst");
        assert_eq!(complaint.status, FactStatus::Confirmed);

        let onset = find(&facts, FIELD_ONSET).unwrap();
        assert_eq!(onset.value.render(), "gisteren");
        assert_eq!(onset.span.unwrap().slice(text), Some("gisteren"));

        let character = find(&facts, FIELD_CHARACTER).unwrap();
        assert_eq!(character.value.render(), "drukkend");

        let aggravating = find(&facts, FIELD_AGGRAVATING).unwrap();
        assert_eq!(aggravating.value.render(), "inspanning");

        let reason = find(&facts, FIELD_REASON).unwrap();
        assert_eq!(reason.value.render(), "pijn op borst");
    }

    #[test]
    fn every_grounded_fact_span_resolves() {
        let text = "Pati\u{eb}nt: Ik heb sinds 3 dagen hoofdpijn, hevig, beter in rust.";
        let facts = facts_for(text);
        for fact in &facts {
            if fact.status != FactStatus::Missing {
                let span = fact.span.expect("non-missing fact must cite a span");
                assert!(span.slice(text).is_some(), "span must resolve: {fact:?}");
            }
        }
    }

    #[test]
    fn clinician_questions_are_not_complaints() {
        let text = "Dokter: Heeft u pijn op de borst? Pati\u{eb}nt: Nee, alleen hoofdpijn.";
        let facts = facts_for(text);
        let complaints: Vec<_> = facts
            .iter()
            .filter(|f| f.field_name == FIELD_COMPLAINT)
            .collect();
        assert_eq!(complaints.len(), 1);
        assert_eq!(complaints[0].value.render(), "hoofdpijn");
    }

    #[test]
    fn hedged_statement_yields_ambiguous_facts() {
        let text = "Pati\u{eb}nt: Misschien heb ik last van hartkloppingen.";
        let facts = facts_for(text);
        let complaint = find(&facts, FIELD_COMPLAINT).unwrap();
        assert_eq!(complaint.status, FactStatus::Ambiguous);
        assert_eq!(complaint.certainty, CertaintyMarker::Hedge);
    }

    #[test]
    fn relevant_antecedents_are_kept_and_others_dropped() {
        let text = "Pati\u{eb}nt: Ik heb vorig jaar een hartinfarct gehad. Ik heb ook een nieuwe fiets gekregen.";
        let facts = facts_for(text);
        let items: Vec<_> = facts
            .iter()
            .filter(|f| f.field_name == FIELD_HISTORY_ITEM)
            .collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].value.render().contains("hartinfarct"));
    }

    #[test]
    fn family_history_is_annotated() {
        let text = "Pati\u{eb}nt: Mijn vader heeft een hartaanval gehad.";
        let facts = facts_for(text);
        let item = find(&facts, FIELD_HISTORY_ITEM).unwrap();
        assert!(item.note.as_deref().unwrap().contains("vader"));
    }

    #[test]
    fn repeated_complaint_bumps_mentions() {
        let text =
            "Pati\u{eb}nt: Ik heb hoofdpijn. De hoofdpijn is er al dagen.";
        let facts = facts_for(text);
        let complaint = find(&facts, FIELD_COMPLAINT).unwrap();
        assert_eq!(complaint.mentions, 2);
    }

    #[test]
    fn overlapping_complaint_patterns_count_one_mention() {
        let text = "Pati\u{eb}nt: Ik heb last van hoofdpijn.";
        let facts = facts_for(text);
        let complaint = find(&facts, FIELD_COMPLAINT).unwrap();
        assert_eq!(complaint.value.render(), "hoofdpijn");
        assert_eq!(complaint.mentions, 1);
    }

    #[test]
    fn missing_qualifiers_become_information_gaps() {
        let text = "Pati\u{eb}nt: Ik heb pijn op de borst.";
        let facts = facts_for(text);
        let gaps: Vec<_> = facts
            .iter()
            .filter(|f| f.field_name == FIELD_INFO_GAP)
            .collect();
        // Onset, karakter and ernst all unreported.
        assert_eq!(gaps.len(), 3);
        assert!(gaps.iter().all(|g| g.status == FactStatus::Missing));
        assert!(gaps
            .iter()
            .any(|g| g.note.as_deref().unwrap().contains("Onset")));
    }

    #[test]
    fn explicit_reason_wins_over_condensed_complaint() {
        let text = "Pati\u{eb}nt: Ik kom hier voor controle van mijn bloeddruk. Ik heb ook hoofdpijn.";
        let facts = facts_for(text);
        let reason = find(&facts, FIELD_REASON).unwrap();
        assert!(reason.value.render().contains("controle"));
    }

    #[test]
    fn red_flags_are_collected_once() {
        let text = "Pati\u{eb}nt: Ik ben flauwgevallen, echt flauwgevallen.";
        let facts = facts_for(text);
        let flags: Vec<_> = facts
            .iter()
            .filter(|f| f.field_name == FIELD_RED_FLAG)
            .collect();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].mentions, 2);
    }
}

//! Report assembly.
//!
//! Pure formatting over a finished draft: fixed section and field order,
//! explicit markers for everything that was not dictated, no clinical logic.
//! Rendering the same draft twice yields byte-identical output.

use chrono::NaiveDate;

use crate::extraction::history::{
    DETAIL_FIELDS, FIELD_COMPLAINT, FIELD_HISTORY_ITEM, FIELD_INFO_GAP, FIELD_REASON,
    FIELD_RED_FLAG,
};
use crate::extraction::{ExtractedFact, FactStatus};
use crate::job::{Draft, ProcessingMode};
use crate::template::{template_for, InvestigationType};

/// Marker for fields the dictation never filled. Deliberately loud: a
/// reader must see the hole, not an invented value.
pub const MISSING_MARKER: &str = "[niet vermeld]";

// ═══════════════════════════════════════════════════════════
// Entry point
// ═══════════════════════════════════════════════════════════

/// Renders the final report text for a draft.
pub fn render(
    mode: ProcessingMode,
    investigation: Option<InvestigationType>,
    draft: &Draft,
    date: NaiveDate,
) -> String {
    match mode {
        ProcessingMode::Examination => {
            render_examination(investigation.unwrap_or(InvestigationType::Generic), draft, date)
        }
        ProcessingMode::History => render_history(draft, date),
    }
}

// ═══════════════════════════════════════════════════════════
// Examination reports
// ═══════════════════════════════════════════════════════════

fn render_examination(investigation: InvestigationType, draft: &Draft, date: NaiveDate) -> String {
    let template = template_for(investigation);
    let mut out = format!("{} op {}:\n", investigation.label(), date.format("%d-%m-%Y"));

    if draft.facts.is_empty() {
        out.push_str("Geen gestructureerde bevindingen gedicteerd.\n");
        return out;
    }
    for fact in &draft.facts {
        let label = template.field_label(&fact.field_name);
        out.push_str(&format!("- {}: {}\n", label, field_text(fact)));
    }
    out
}

fn field_text(fact: &ExtractedFact) -> String {
    match fact.status {
        FactStatus::Missing => MISSING_MARKER.to_string(),
        FactStatus::Confirmed => match &fact.note {
            Some(note) => format!("{} ({note})", fact.value.render()),
            None => fact.value.render(),
        },
        FactStatus::Ambiguous => match &fact.note {
            Some(note) => format!("{} (onzeker: {note})", fact.value.render()),
            None => format!("{} (onzeker)", fact.value.render()),
        },
    }
}

// ═══════════════════════════════════════════════════════════
// History reports
// ═══════════════════════════════════════════════════════════

fn detail_label(field: &str) -> &'static str {
    match field {
        "onset" => "Onset",
        "character" => "Karakter",
        "location" => "Lokalisatie",
        "severity" => "Ernst",
        "aggravating_factor" => "Verergerend",
        "relieving_factor" => "Verlichtend",
        _ => "Detail",
    }
}

fn render_history(draft: &Draft, date: NaiveDate) -> String {
    let mut out = format!("Anamnese op {}:\n\n", date.format("%d-%m-%Y"));

    let reason = draft
        .facts
        .iter()
        .find(|f| f.field_name == FIELD_REASON)
        .map(field_text)
        .unwrap_or_else(|| MISSING_MARKER.to_string());
    out.push_str(&format!("Reden van komst: {reason}\n"));

    // Complaints with their qualifiers, in extraction order: a complaint
    // opens a numbered block, detail facts attach to the open block.
    out.push_str("\nHoofdklachten:\n");
    let mut blocks: Vec<(String, Vec<String>)> = Vec::new();
    let mut orphans: Vec<String> = Vec::new();
    for fact in &draft.facts {
        if fact.field_name == FIELD_COMPLAINT {
            blocks.push((field_text(fact), Vec::new()));
        } else if DETAIL_FIELDS.contains(&fact.field_name.as_str()) {
            let line = format!("{}: {}", detail_label(&fact.field_name), field_text(fact));
            match blocks.last_mut() {
                Some((_, details)) => details.push(line),
                None => orphans.push(line),
            }
        }
    }
    if blocks.is_empty() && orphans.is_empty() {
        out.push_str(&format!("{MISSING_MARKER}\n"));
    }
    for line in &orphans {
        out.push_str(&format!("- {line}\n"));
    }
    for (i, (complaint, details)) in blocks.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, complaint));
        for line in details {
            out.push_str(&format!("   - {line}\n"));
        }
    }

    out.push_str("\nRelevante voorgeschiedenis:\n");
    push_section(&mut out, draft, FIELD_HISTORY_ITEM, |f| field_text(f));

    out.push_str("\nAandachtspunten:\n");
    push_section(&mut out, draft, FIELD_RED_FLAG, |f| {
        format!("Pati\u{eb}nt meldt: {}", field_text(f))
    });

    out.push_str("\nOntbrekende informatie:\n");
    push_section(&mut out, draft, FIELD_INFO_GAP, |f| {
        f.note.clone().unwrap_or_else(|| MISSING_MARKER.to_string())
    });

    out
}

fn push_section(
    out: &mut String,
    draft: &Draft,
    field: &str,
    line: impl Fn(&ExtractedFact) -> String,
) {
    let mut any = false;
    for fact in draft.facts.iter().filter(|f| f.field_name == field) {
        out.push_str(&format!("- {}\n", line(fact)));
        any = true;
    }
    if !any {
        out.push_str("- geen\n");
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{history, templated, FactValue};
    use crate::template::bind_fields;
    use crate::transcript::segmenter::segment;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn ecg_draft(text: &str) -> Draft {
        let transcript = segment(text).unwrap();
        let template = template_for(InvestigationType::Ecg);
        let candidates = templated::extract_template_fields(&transcript, template);
        Draft::new(0, bind_fields(template, candidates))
    }

    #[test]
    fn partial_ecg_renders_values_and_missing_markers() {
        let draft =
            ecg_draft("ECG toont sinusritme met frequentie van 75 per minuut. PR interval 160 ms.");
        let report = render(ProcessingMode::Examination, Some(InvestigationType::Ecg), &draft, date());

        assert!(report.starts_with("ECG op 14-03-2026:"));
        assert!(report.contains("- Ritme: sinusritme"));
        assert!(report.contains("- Frequentie: 75/min"));
        assert!(report.contains("- PR-interval: 160 ms"));
        assert!(report.contains("- QRS: [niet vermeld]"));
        assert!(report.contains("- Repolarisatie: [niet vermeld]"));
        assert!(report.contains("- QTc: [niet vermeld]"));
        // Nothing invented: no value appears for fields never dictated.
        assert_eq!(report.matches(MISSING_MARKER).count(), 3);
    }

    #[test]
    fn corrected_value_appears_exactly_once() {
        let draft = ecg_draft(
            "ECG met frequentie 80 per minuut. Correctie, frequentie 75 per minuut. PR interval 160 ms.",
        );
        let report = render(ProcessingMode::Examination, Some(InvestigationType::Ecg), &draft, date());
        assert!(report.contains("- Frequentie: 75/min"));
        assert!(!report.contains("80"));
    }

    #[test]
    fn ambiguous_fact_is_marked_uncertain() {
        let mut draft = ecg_draft("ECG toont sinusritme. PR interval 160 ms.");
        let pr = draft
            .facts
            .iter_mut()
            .find(|f| f.field_name == "pr")
            .unwrap();
        pr.downgrade("validatie: niet ondersteund");
        let report = render(ProcessingMode::Examination, Some(InvestigationType::Ecg), &draft, date());
        assert!(report.contains("160 ms (onzeker: validatie: niet ondersteund)"));
    }

    #[test]
    fn generic_examination_renders_header_only() {
        let draft = Draft::new(0, Vec::new());
        let report = render(ProcessingMode::Examination, Some(InvestigationType::Generic), &draft, date());
        assert!(report.starts_with("Algemeen onderzoek op 14-03-2026:"));
        assert!(report.contains("Geen gestructureerde bevindingen"));
    }

    #[test]
    fn history_report_has_all_sections_in_order() {
        let text = "Dokter: Wat zijn uw klachten? Pati\u{eb}nt: Ik heb sinds gisteren pijn op de borst, drukkend, erger bij inspanning.";
        let draft = Draft::new(0, history::extract_history(&segment(text).unwrap()));
        let report = render(ProcessingMode::History, None, &draft, date());

        let sections = [
            "Reden van komst: pijn op borst",
            "Hoofdklachten:",
            "1. pijn op de borst",
            "Onset: gisteren",
            "Karakter: drukkend",
            "Verergerend: inspanning",
            "Relevante voorgeschiedenis:",
            "Aandachtspunten:",
            "Ontbrekende informatie:",
        ];
        let mut cursor = 0;
        for section in sections {
            let found = report[cursor..]
                .find(section)
                .unwrap_or_else(|| panic!("missing '{section}' in:\n{report}"));
            cursor += found;
        }
        // Ernst was never dictated.
        assert!(report.contains("Ernst van 'pijn op de borst' niet vermeld"));
    }

    #[test]
    fn empty_history_sections_render_explicitly() {
        let text = "Pati\u{eb}nt: Alles gaat goed vandaag.";
        let draft = Draft::new(0, history::extract_history(&segment(text).unwrap()));
        let report = render(ProcessingMode::History, None, &draft, date());
        assert!(report.contains("Reden van komst: [niet vermeld]"));
        assert!(report.contains("Hoofdklachten:\n[niet vermeld]"));
        assert!(report.contains("Relevante voorgeschiedenis:\n- geen"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let draft = ecg_draft("ECG toont sinusritme. PR interval 160 ms.");
        let a = render(ProcessingMode::Examination, Some(InvestigationType::Ecg), &draft, date());
        let b = render(ProcessingMode::Examination, Some(InvestigationType::Ecg), &draft, date());
        assert_eq!(a, b);
    }

    #[test]
    fn missing_value_never_renders_a_number() {
        let mut fact = crate::extraction::ExtractedFact::missing("qtc");
        fact.value = FactValue::Empty;
        let draft = Draft::new(0, vec![fact]);
        let report = render(ProcessingMode::Examination, Some(InvestigationType::Ecg), &draft, date());
        assert!(report.contains("- QTc: [niet vermeld]"));
    }
}

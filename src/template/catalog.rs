//! Investigation template catalog.
//!
//! One template per supported cardiac investigation. A template fixes the
//! report field order, the extraction pattern per field, plausible numeric
//! ranges, and which fields a complete report must mention.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationType {
    Ecg,
    ExerciseTest,
    Echo,
    DeviceCheck,
    Holter,
    Generic,
}

impl InvestigationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestigationType::Ecg => "ecg",
            InvestigationType::ExerciseTest => "exercise_test",
            InvestigationType::Echo => "echo",
            InvestigationType::DeviceCheck => "device_check",
            InvestigationType::Holter => "holter",
            InvestigationType::Generic => "generic",
        }
    }

    /// Dutch report heading.
    pub fn label(&self) -> &'static str {
        match self {
            InvestigationType::Ecg => "ECG",
            InvestigationType::ExerciseTest => "Fietsproef",
            InvestigationType::Echo => "Echocardiografie",
            InvestigationType::DeviceCheck => "Device-controle",
            InvestigationType::Holter => "Holter-monitoring",
            InvestigationType::Generic => "Algemeen onderzoek",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Choice,
    Text,
}

/// One slot in a template: where a value may come from and what makes it
/// plausible.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Dutch report label.
    pub label: &'static str,
    pub kind: FieldKind,
    /// Canonical unit; candidates dictated without it stay ambiguous.
    pub unit: Option<&'static str>,
    /// Inclusive plausibility bounds for numeric fields.
    pub valid_range: Option<(f64, f64)>,
    pub required: bool,
    pattern: Regex,
}

impl FieldSpec {
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

pub struct InvestigationTemplate {
    pub investigation: InvestigationType,
    /// Trigger phrases for classification; substring match on the lowercased
    /// transcript.
    pub keywords: &'static [&'static str],
    fields: Vec<FieldSpec>,
}

impl InvestigationTemplate {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_label<'a>(&'a self, name: &'a str) -> &'a str {
        self.field(name).map_or(name, |f| f.label)
    }
}

// ═══════════════════════════════════════════════════════════
// Catalog
// ═══════════════════════════════════════════════════════════

fn spec(
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    unit: Option<&'static str>,
    valid_range: Option<(f64, f64)>,
    required: bool,
    pattern: &str,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        unit,
        valid_range,
        required,
        pattern: Regex::new(pattern).expect("catalog pattern must compile"),
    }
}

static CATALOG: LazyLock<Vec<InvestigationTemplate>> = LazyLock::new(|| {
    vec![
        InvestigationTemplate {
            investigation: InvestigationType::Ecg,
            keywords: &["ecg", "elektrocardiogram", "ritme", "pr interval", "qrs", "qtc"],
            fields: vec![
                spec(
                    "rhythm",
                    "Ritme",
                    FieldKind::Choice,
                    None,
                    None,
                    true,
                    r"(?i)\b(?P<val>sinusritme|sinusaal ritme|sinustachycardie|sinusbradycardie|voorkamerfibrillatie|vkf|voorkamerflutter|atriale tachycardie|nodaal ritme|pacemakerritme)\b",
                ),
                spec(
                    "rate",
                    "Frequentie",
                    FieldKind::Numeric,
                    Some("/min"),
                    Some((30.0, 250.0)),
                    true,
                    r"(?i)\b(?:frequentie|hartslag|ventriculair antwoord)\D{0,20}?(?P<val>\d{2,3})\s*(?P<unit>/min|per minuut|bpm)?",
                ),
                spec(
                    "pr",
                    "PR-interval",
                    FieldKind::Numeric,
                    Some("ms"),
                    Some((80.0, 300.0)),
                    true,
                    r"(?i)\bPR(?:[ -]?interval)?\D{0,20}?(?P<val>\d{2,3})\s*(?P<unit>ms|milliseconden)?",
                ),
                spec(
                    "qrs",
                    "QRS",
                    FieldKind::Text,
                    None,
                    None,
                    true,
                    r"(?i)\bQRS\s*(?:is\s+|complex\s+)?(?P<val>smal|verbreed|normaal)",
                ),
                spec(
                    "repolarisation",
                    "Repolarisatie",
                    FieldKind::Text,
                    None,
                    None,
                    true,
                    r"(?i)\brepolarisatie\s*(?:is\s+)?(?P<val>normaal|gestoord|afwijkend)",
                ),
                spec(
                    "qtc",
                    "QTc",
                    FieldKind::Numeric,
                    Some("ms"),
                    Some((300.0, 600.0)),
                    true,
                    r"(?i)\bQTc\D{0,20}?(?P<val>\d{3})\s*(?P<unit>ms|milliseconden)?",
                ),
            ],
        },
        InvestigationTemplate {
            investigation: InvestigationType::ExerciseTest,
            keywords: &["fietsproef", "inspanningstest", "ergometrie", "cycloergometrie", "watt"],
            fields: vec![
                spec(
                    "max_load",
                    "Maximale belasting",
                    FieldKind::Numeric,
                    Some("W"),
                    Some((25.0, 400.0)),
                    true,
                    r"(?i)\b(?:tot|maximaal|belasting van)\s+(?P<val>\d{2,3})\s*(?P<unit>watt|W)\b",
                ),
                spec(
                    "max_rate",
                    "Maximale hartslag",
                    FieldKind::Numeric,
                    Some("/min"),
                    Some((30.0, 250.0)),
                    true,
                    r"(?i)\b(?:hartslag|pols)\D{0,30}?(?:tot|maximaal)\s+(?P<val>\d{2,3})\s*(?P<unit>/min|per minuut|bpm)?",
                ),
                spec(
                    "bp_systolic",
                    "Systolische bloeddruk",
                    FieldKind::Numeric,
                    Some("mmHg"),
                    Some((70.0, 250.0)),
                    false,
                    r"(?i)\bbloeddruk\D{0,30}?(?P<val>\d{2,3})\s*/\s*\d{2,3}\s*(?P<unit>mmHg)?",
                ),
                spec(
                    "bp_diastolic",
                    "Diastolische bloeddruk",
                    FieldKind::Numeric,
                    Some("mmHg"),
                    Some((40.0, 150.0)),
                    false,
                    r"(?i)\bbloeddruk\D{0,30}?\d{2,3}\s*/\s*(?P<val>\d{2,3})\s*(?P<unit>mmHg)?",
                ),
                spec(
                    "symptoms",
                    "Klachten tijdens inspanning",
                    FieldKind::Text,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>geen) klachten\b|\bklachten\s*:?\s*(?P<val2>geen|wel)\b",
                ),
                spec(
                    "ischemia",
                    "Ischemie",
                    FieldKind::Text,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>geen|wel)\s+(?:argumenten voor\s+)?ischemie",
                ),
                spec(
                    "arrhythmia",
                    "Aritmie",
                    FieldKind::Text,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>geen|wel)\s+aritmie",
                ),
            ],
        },
        InvestigationTemplate {
            investigation: InvestigationType::Echo,
            keywords: &["tte", "echocardiografie", "echo", "linker ventrikel", "lvef", "ejectiefractie", "tapse"],
            fields: vec![
                spec(
                    "lvef",
                    "LVEF",
                    FieldKind::Numeric,
                    Some("%"),
                    Some((10.0, 80.0)),
                    true,
                    r"(?i)\b(?:LVEF|ejectiefractie)\D{0,15}?(?P<val>\d{2})\s*(?P<unit>%|procent)?",
                ),
                spec(
                    "lv_function",
                    "Globale LV-functie",
                    FieldKind::Text,
                    None,
                    None,
                    true,
                    r"(?i)\bglobale (?:LV-)?functie\s*(?:is\s+)?(?P<val>goed|bewaard|licht gedaald|matig gedaald|ernstig gedaald)",
                ),
                spec(
                    "lv_edd",
                    "LV EDD",
                    FieldKind::Numeric,
                    Some("mm"),
                    Some((30.0, 80.0)),
                    false,
                    r"(?i)\bEDD\D{0,10}?(?P<val>\d{2})\s*(?P<unit>mm)?",
                ),
                spec(
                    "ivs",
                    "Septumdikte",
                    FieldKind::Numeric,
                    Some("mm"),
                    Some((5.0, 25.0)),
                    false,
                    r"(?i)\b(?:IVS|septum)\D{0,10}?(?P<val>\d{1,2})\s*(?P<unit>mm)?",
                ),
                spec(
                    "regional",
                    "Regionaal",
                    FieldKind::Text,
                    None,
                    None,
                    false,
                    r"(?i)\bregionaal\s*:?\s*(?P<val>geen kinetiekstoornissen|hypokinesie[a-z\u{e0}-\u{ff} ]{0,30}|akinesie[a-z\u{e0}-\u{ff} ]{0,30})",
                ),
                spec(
                    "tapse",
                    "TAPSE",
                    FieldKind::Numeric,
                    Some("mm"),
                    Some((5.0, 35.0)),
                    false,
                    r"(?i)\bTAPSE\D{0,10}?(?P<val>\d{2})\s*(?P<unit>mm)?",
                ),
                spec(
                    "la_dimension",
                    "Linker atrium",
                    FieldKind::Numeric,
                    Some("mm"),
                    Some((20.0, 70.0)),
                    false,
                    r"(?i)\blinker atrium\D{0,10}?(?P<val>\d{2})\s*(?P<unit>mm)?",
                ),
                spec(
                    "mitral_regurg",
                    "Mitralisinsufficiëntie",
                    FieldKind::Text,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>geen|milde|matige|ernstige)\s+mitralisinsuffici\u{eb}ntie",
                ),
            ],
        },
        InvestigationTemplate {
            investigation: InvestigationType::DeviceCheck,
            keywords: &["pacemaker", "icd", "crt", "batterij", "lead", "sensing", "device"],
            fields: vec![
                spec(
                    "device_type",
                    "Type",
                    FieldKind::Choice,
                    None,
                    None,
                    true,
                    r"(?i)\b(?P<val>pacemaker|ICD|CRT-P|CRT-D)\b",
                ),
                spec(
                    "battery",
                    "Batterij",
                    FieldKind::Numeric,
                    Some("%"),
                    Some((0.0, 100.0)),
                    true,
                    r"(?i)\bbatterij\D{0,20}?(?P<val>\d{1,3})\s*(?P<unit>%|procent)?",
                ),
                spec(
                    "battery_years",
                    "Resterende levensduur",
                    FieldKind::Numeric,
                    Some("jaar"),
                    Some((0.0, 15.0)),
                    false,
                    r"(?i)\blevensduur\D{0,15}?(?P<val>\d{1,2}(?:[.,]\d)?)\s*(?P<unit>jaar)\b",
                ),
                spec(
                    "rv_sensing",
                    "RV sensing",
                    FieldKind::Numeric,
                    Some("mV"),
                    Some((1.0, 30.0)),
                    false,
                    r"(?i)\bsensing\D{0,20}?(?P<val>\d{1,2}(?:[.,]\d)?)\s*(?P<unit>mV|millivolt)\b",
                ),
                spec(
                    "rv_threshold",
                    "RV drempel",
                    FieldKind::Numeric,
                    Some("V"),
                    Some((0.1, 5.0)),
                    false,
                    r"(?i)\bdrempel\D{0,20}?(?P<val>\d(?:[.,]\d{1,2})?)\s*(?P<unit>V|volt)\b",
                ),
                spec(
                    "episodes",
                    "Aritmie-episodes",
                    FieldKind::Text,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>geen|\d+)\s+(?:aritmie-?)?episodes\b",
                ),
            ],
        },
        InvestigationTemplate {
            investigation: InvestigationType::Holter,
            keywords: &["holter", "monitoring", "extrasystolen", "pauzes", "registratie"],
            fields: vec![
                spec(
                    "duration",
                    "Registratieduur",
                    FieldKind::Numeric,
                    Some("uur"),
                    Some((12.0, 48.0)),
                    true,
                    r"(?i)\b(?:holter|monitoring|registratie)\D{0,25}?(?P<val>\d{2})\s*(?P<unit>uur)\b",
                ),
                spec(
                    "avg_rate",
                    "Gemiddelde frequentie",
                    FieldKind::Numeric,
                    Some("/min"),
                    Some((30.0, 250.0)),
                    true,
                    r"(?i)\bgemiddelde?\D{0,25}?(?P<val>\d{2,3})\s*(?P<unit>/min|per minuut|bpm)?",
                ),
                spec(
                    "min_rate",
                    "Minimale frequentie",
                    FieldKind::Numeric,
                    Some("/min"),
                    Some((20.0, 250.0)),
                    false,
                    r"(?i)\bminim\w*\D{0,25}?(?P<val>\d{2,3})\s*(?P<unit>/min|per minuut|bpm)?",
                ),
                spec(
                    "max_rate",
                    "Maximale frequentie",
                    FieldKind::Numeric,
                    Some("/min"),
                    Some((30.0, 300.0)),
                    false,
                    r"(?i)\bmaxim\w*\D{0,25}?(?P<val>\d{2,3})\s*(?P<unit>/min|per minuut|bpm)?",
                ),
                spec(
                    "sves",
                    "Supraventriculaire extrasystolen",
                    FieldKind::Numeric,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>\d+)\s+supraventriculaire extrasystolen\b",
                ),
                spec(
                    "ves",
                    "Ventriculaire extrasystolen",
                    FieldKind::Numeric,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>\d+)\s+ventriculaire extrasystolen\b",
                ),
                spec(
                    "pauses",
                    "Pauzes",
                    FieldKind::Text,
                    None,
                    None,
                    false,
                    r"(?i)\b(?P<val>geen)\s+(?:significante\s+)?pauzes\b|\bpauzes\s*:?\s*(?P<val2>geen|wel)\b",
                ),
            ],
        },
        // Fallback when no investigation scores: header only, nothing is
        // guessed.
        InvestigationTemplate {
            investigation: InvestigationType::Generic,
            keywords: &[],
            fields: vec![],
        },
    ]
});

pub fn catalog() -> &'static [InvestigationTemplate] {
    &CATALOG
}

pub fn template_for(investigation: InvestigationType) -> &'static InvestigationTemplate {
    CATALOG
        .iter()
        .find(|t| t.investigation == investigation)
        .unwrap_or_else(|| &CATALOG[CATALOG.len() - 1])
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_investigation_has_a_template() {
        for inv in [
            InvestigationType::Ecg,
            InvestigationType::ExerciseTest,
            InvestigationType::Echo,
            InvestigationType::DeviceCheck,
            InvestigationType::Holter,
            InvestigationType::Generic,
        ] {
            assert_eq!(template_for(inv).investigation, inv);
        }
    }

    #[test]
    fn numeric_fields_carry_plausibility_ranges() {
        for template in catalog() {
            for field in template.fields() {
                if field.kind == FieldKind::Numeric && field.name != "sves" && field.name != "ves" {
                    assert!(
                        field.valid_range.is_some(),
                        "{}.{} lacks a range",
                        template.investigation.as_str(),
                        field.name
                    );
                }
            }
        }
    }

    #[test]
    fn ecg_template_requires_all_six_fields() {
        let template = template_for(InvestigationType::Ecg);
        assert_eq!(template.fields().len(), 6);
        assert!(template.fields().iter().all(|f| f.required));
    }

    #[test]
    fn generic_template_has_no_fields() {
        assert!(template_for(InvestigationType::Generic).fields().is_empty());
    }

    #[test]
    fn field_label_falls_back_to_name() {
        let template = template_for(InvestigationType::Ecg);
        assert_eq!(template.field_label("pr"), "PR-interval");
        assert_eq!(template.field_label("unknown_field"), "unknown_field");
    }

    #[test]
    fn investigation_type_serializes_snake_case() {
        let json = serde_json::to_string(&InvestigationType::ExerciseTest).unwrap();
        assert_eq!(json, "\"exercise_test\"");
    }
}

//! Hedge detection.
//!
//! Dutch hedging vocabulary downgrades every fact taken from the statement:
//! "mogelijk voorkamerfibrillatie" is a suspicion, not a finding.

use std::sync::LazyLock;

use regex::Regex;

use super::types::CertaintyMarker;

static HEDGE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(mogelijk|mogelijke|waarschijnlijk|misschien|vermoedelijk|wellicht|eventueel|eventuele|lijkt|vermoeden)\b",
    )
    .unwrap()
});

/// Classifies a whole statement. A single hedge word marks the statement as
/// hedged; finer-grained scoping is deliberately not attempted.
pub fn statement_certainty(statement_text: &str) -> CertaintyMarker {
    if HEDGE_WORDS.is_match(statement_text) {
        CertaintyMarker::Hedge
    } else {
        CertaintyMarker::Explicit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_statement_is_explicit() {
        assert_eq!(
            statement_certainty("ECG toont sinusritme."),
            CertaintyMarker::Explicit
        );
    }

    #[test]
    fn hedge_words_are_detected() {
        for text in [
            "Mogelijk voorkamerfibrillatie.",
            "Dit lijkt een oud infarct.",
            "Waarschijnlijk sinusaal ritme.",
            "Vermoedelijk medicatie-effect.",
        ] {
            assert_eq!(statement_certainty(text), CertaintyMarker::Hedge, "{text}");
        }
    }

    #[test]
    fn hedge_match_is_word_bounded() {
        // "lijkt" must not fire inside other words.
        assert_eq!(
            statement_certainty("Vergelijkbare waarden als vorige controle."),
            CertaintyMarker::Explicit
        );
    }
}

use super::SignalExtractor;
use crate::lists::ReferenceLists;
use crate::normalizer::NormalizedEmail;
use crate::signal::{Severity, Signal, SignalCategory};
use std::sync::Arc;

/// Weight of a single pressure phrase.
const URGENCY_WEIGHT: f64 = 0.15;
/// Hard cap on emitted urgency signals. Together with the aggregator's
/// category ceiling this keeps wording alone from manufacturing a verdict.
const MAX_URGENCY_SIGNALS: usize = 4;

/// Flags the pressure phrasing phishing leans on: urgency, threatened
/// suspension, artificial deadlines.
pub struct LanguageExtractor {
    lists: Arc<ReferenceLists>,
}

impl LanguageExtractor {
    pub fn new(lists: Arc<ReferenceLists>) -> Self {
        LanguageExtractor { lists }
    }
}

impl SignalExtractor for LanguageExtractor {
    fn name(&self) -> &'static str {
        "language"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Language
    }

    fn extract(&self, email: &NormalizedEmail) -> Vec<Signal> {
        let mut haystack = email.body_text.to_lowercase();
        if let Some(subject) = email.header_first("subject") {
            haystack.push(' ');
            haystack.push_str(&subject.to_lowercase());
        }
        if haystack.trim().is_empty() {
            return Vec::new();
        }

        let mut signals = Vec::new();
        for phrase in &self.lists.urgency_phrases {
            if signals.len() >= MAX_URGENCY_SIGNALS {
                break;
            }
            if haystack.contains(phrase.as_str()) {
                signals.push(
                    Signal::new(
                        "urgency_phrase",
                        SignalCategory::Language,
                        Severity::Low,
                        URGENCY_WEIGHT,
                        format!("pressure wording \"{phrase}\""),
                    )
                    .from_body(),
                );
            }
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;

    fn extractor() -> LanguageExtractor {
        LanguageExtractor::new(Arc::new(ReferenceLists::default()))
    }

    fn normalize(raw: &str) -> NormalizedEmail {
        Normalizer::new(Arc::new(ReferenceLists::default())).normalize(raw)
    }

    #[test]
    fn test_urgency_phrases_fire() {
        let email = normalize("From: a@example.com\n\nYour account is suspended. Verify now!");
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), 2);
        assert!(signals.iter().all(|s| s.id == "urgency_phrase"));
        assert!(signals.iter().all(|s| s.severity == Severity::Low));
        assert!(signals.iter().all(|s| s.evidence_from_body));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let email = normalize("From: a@example.com\n\nACT NOW or lose access");
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), 1);
        assert!(signals[0].evidence.contains("act now"));
    }

    #[test]
    fn test_subject_is_scanned() {
        let email = normalize("Subject: Action Required\nFrom: a@example.com\n\nnothing special");
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn test_signal_count_is_capped() {
        let email = normalize(
            "From: a@example.com\n\nurgent! act now! verify now! limited time! suspended! \
             unusual activity! action required! immediately!",
        );
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), MAX_URGENCY_SIGNALS);
    }

    #[test]
    fn test_calm_text_is_quiet() {
        let email = normalize("From: a@example.com\n\nLunch on Friday? The park was lovely.");
        assert!(extractor().extract(&email).is_empty());
    }
}

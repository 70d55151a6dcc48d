use super::SignalExtractor;
use crate::lists::ReferenceLists;
use crate::normalizer::NormalizedEmail;
use crate::signal::{Severity, Signal, SignalCategory};
use regex::Regex;
use std::sync::Arc;

/// A request for passwords, card numbers or similar anywhere in the body.
const SENSITIVE_DATA_WEIGHT: f64 = 0.55;
/// Impersonal greeting combined with a credential/payment request.
const GENERIC_GREETING_WEIGHT: f64 = 0.4;

/// Looks at how the mail is built: who it addresses and what it asks for.
pub struct StructureExtractor {
    lists: Arc<ReferenceLists>,
    sensitive_regex: Regex,
}

impl StructureExtractor {
    pub fn new(lists: Arc<ReferenceLists>) -> Self {
        // Word-bounded alternation so "ssn" does not fire inside "assn"
        let pattern = format!(
            r"(?i)\b(?:{})\b",
            lists
                .sensitive_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|")
        );
        StructureExtractor {
            sensitive_regex: Regex::new(&pattern).unwrap(),
            lists,
        }
    }
}

impl SignalExtractor for StructureExtractor {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Structure
    }

    fn extract(&self, email: &NormalizedEmail) -> Vec<Signal> {
        let body = email.body_text.to_lowercase();
        if body.trim().is_empty() {
            return Vec::new();
        }

        let mut signals = Vec::new();

        let sensitive_hit = self
            .sensitive_regex
            .find(&body)
            .map(|m| m.as_str().to_string());
        if let Some(keyword) = &sensitive_hit {
            signals.push(
                Signal::new(
                    "sensitive_data_request",
                    SignalCategory::Structure,
                    Severity::High,
                    SENSITIVE_DATA_WEIGHT,
                    format!("the body mentions \"{keyword}\""),
                )
                .from_body(),
            );
        }

        let greeting = self
            .lists
            .generic_greetings
            .iter()
            .find(|g| body.contains(g.as_str()));
        if let Some(greeting) = greeting {
            let asks_for_something = sensitive_hit.is_some()
                || self
                    .lists
                    .payment_request_phrases
                    .iter()
                    .any(|p| body.contains(p.as_str()));
            if asks_for_something {
                signals.push(
                    Signal::new(
                        "generic_greeting_request",
                        SignalCategory::Structure,
                        Severity::Medium,
                        GENERIC_GREETING_WEIGHT,
                        format!(
                            "impersonal greeting \"{greeting}\" combined with a credential or payment request"
                        ),
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

    fn extractor() -> StructureExtractor {
        StructureExtractor::new(Arc::new(ReferenceLists::default()))
    }

    fn normalize(raw: &str) -> NormalizedEmail {
        Normalizer::new(Arc::new(ReferenceLists::default())).normalize(raw)
    }

    #[test]
    fn test_sensitive_keyword_fires_high() {
        let email = normalize("From: a@example.com\n\nPlease reply with your password today");
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "sensitive_data_request");
        assert_eq!(signals[0].severity, Severity::High);
        assert!(signals[0].evidence.contains("password"));
    }

    #[test]
    fn test_word_boundary_respected() {
        let email = normalize("From: a@example.com\n\nThe assn. meeting is on Tuesday");
        assert!(extractor().extract(&email).is_empty());
    }

    #[test]
    fn test_generic_greeting_with_request() {
        let email = normalize(
            "From: a@example.com\n\nDear customer, please update your payment details here.",
        );
        let signals = extractor().extract(&email);
        assert!(signals.iter().any(|s| s.id == "generic_greeting_request"));
    }

    #[test]
    fn test_generic_greeting_alone_is_fine() {
        let email = normalize("From: a@example.com\n\nDear customer, your parcel has shipped.");
        assert!(extractor().extract(&email).is_empty());
    }

    #[test]
    fn test_personal_mail_is_quiet() {
        let email = normalize("From: a@example.com\n\nHi Sam, see you at the meeting tomorrow.");
        assert!(extractor().extract(&email).is_empty());
    }
}

use super::SignalExtractor;
use crate::lists::ReferenceLists;
use crate::normalizer::{fold_confusables, NormalizedEmail};
use crate::signal::{Severity, Signal, SignalCategory};
use std::sync::Arc;

/// Display name claims a brand the sender domain does not belong to.
const DISPLAY_SPOOF_WEIGHT: f64 = 0.6;
/// Sender domain is one substitution away from a brand or its domain.
const LOOKALIKE_WEIGHT: f64 = 0.65;
/// Reply-To routed to an unrelated domain.
const REPLY_TO_WEIGHT: f64 = 0.35;
/// Only brand names at least this long get the edit-distance-1 comparison;
/// short names produce too many accidental one-off matches.
const MIN_LOOKALIKE_LEN: usize = 5;

/// Detects senders dressed up as somebody else: brand names in the display
/// name, look-alike and homoglyph domains, and Reply-To redirection.
pub struct SenderSpoofExtractor {
    lists: Arc<ReferenceLists>,
}

impl SenderSpoofExtractor {
    pub fn new(lists: Arc<ReferenceLists>) -> Self {
        SenderSpoofExtractor { lists }
    }

    /// Check if `domain` is `parent` or a subdomain of it.
    fn in_domain(domain: &str, parent: &str) -> bool {
        domain == parent || domain.ends_with(&format!(".{parent}"))
    }

    fn domain_is_canonical(&self, domain: &str, brand: &crate::lists::Brand) -> bool {
        brand.domains.iter().any(|d| Self::in_domain(domain, d))
    }

    /// The folded comparison form of a sender domain: punycode decoded when
    /// applicable, confusables mapped to ASCII.
    fn comparison_form(domain: &str) -> String {
        let decoded = if domain.contains("xn--") {
            let (unicode, _) = idna::domain_to_unicode(domain);
            unicode
        } else {
            domain.to_string()
        };
        fold_confusables(&decoded.to_lowercase())
    }

    fn lookalike_brand(&self, domain: &str) -> Option<&crate::lists::Brand> {
        let folded = Self::comparison_form(domain);

        for brand in &self.lists.brands {
            if self.domain_is_canonical(domain, brand) {
                continue;
            }
            // Whole-domain comparison against the brand's canonical domains
            for canonical in &brand.domains {
                if levenshtein(&folded, canonical) <= 1 {
                    return Some(brand);
                }
            }
            // Token comparison: every hyphen-separated piece of every label
            // except the TLD ("paypa1-secure.com" carries the token "paypa1")
            let labels: Vec<&str> = folded.split('.').collect();
            for label in labels.iter().take(labels.len().saturating_sub(1)) {
                for token in label.split('-') {
                    if token == brand.name {
                        return Some(brand);
                    }
                    if brand.name.len() >= MIN_LOOKALIKE_LEN
                        && levenshtein(token, &brand.name) == 1
                    {
                        return Some(brand);
                    }
                }
            }
        }
        None
    }
}

impl SignalExtractor for SenderSpoofExtractor {
    fn name(&self) -> &'static str {
        "sender_spoof"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::SenderSpoof
    }

    fn extract(&self, email: &NormalizedEmail) -> Vec<Signal> {
        let mut signals = Vec::new();

        if let Some(sender) = &email.sender {
            if let Some(display) = &email.display_name {
                let folded = fold_confusables(&display.to_lowercase());
                if let Some(brand) = self.lists.brand_mentioned(&folded) {
                    if !self.domain_is_canonical(&sender.domain, brand) {
                        signals.push(Signal::new(
                            "display_name_spoof",
                            SignalCategory::SenderSpoof,
                            Severity::High,
                            DISPLAY_SPOOF_WEIGHT,
                            format!(
                                "display name \"{display}\" claims {} but the sender domain is '{}'",
                                brand.name, sender.domain
                            ),
                        ));
                    }
                }
            }

            if let Some(brand) = self.lookalike_brand(&sender.domain) {
                let canonical = brand.domains.first().map(|s| s.as_str()).unwrap_or("");
                signals.push(Signal::new(
                    "lookalike_domain",
                    SignalCategory::SenderSpoof,
                    Severity::High,
                    LOOKALIKE_WEIGHT,
                    format!(
                        "sender domain '{}' is a look-alike of '{canonical}'",
                        sender.domain
                    ),
                ));
            }

            if let Some(reply_to) = &email.reply_to {
                if !Self::in_domain(&reply_to.domain, &sender.domain)
                    && !Self::in_domain(&sender.domain, &reply_to.domain)
                {
                    signals.push(Signal::new(
                        "reply_to_mismatch",
                        SignalCategory::SenderSpoof,
                        Severity::Medium,
                        REPLY_TO_WEIGHT,
                        format!(
                            "replies go to '{}' although the sender is '{}'",
                            reply_to.domain, sender.domain
                        ),
                    ));
                }
            }
        }

        signals
    }
}

/// Two-row Levenshtein over chars; both inputs are short domain tokens.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;

    fn extractor() -> SenderSpoofExtractor {
        SenderSpoofExtractor::new(Arc::new(ReferenceLists::default()))
    }

    fn normalize(raw: &str) -> NormalizedEmail {
        Normalizer::new(Arc::new(ReferenceLists::default())).normalize(raw)
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("paypal", "paypal"), 0);
        assert_eq!(levenshtein("paypol", "paypal"), 1);
        assert_eq!(levenshtein("pay", "paypal"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_display_name_spoof() {
        let email = normalize("From: \"PayPal Support\" <alerts@mail-check.biz>\n\nhello");
        let signals = extractor().extract(&email);
        assert!(signals.iter().any(|s| s.id == "display_name_spoof"));
    }

    #[test]
    fn test_display_name_on_canonical_domain_is_fine() {
        let email = normalize("From: \"PayPal\" <service@paypal.com>\n\nhello");
        let signals = extractor().extract(&email);
        assert!(signals.is_empty());
    }

    #[test]
    fn test_digit_substitution_lookalike() {
        let email = normalize("From: security@paypa1-secure.com\n\nhello");
        let signals = extractor().extract(&email);
        let lookalike = signals.iter().find(|s| s.id == "lookalike_domain").unwrap();
        assert!(lookalike.evidence.contains("paypal.com"));
        assert_eq!(lookalike.severity, Severity::High);
    }

    #[test]
    fn test_one_char_substitution_lookalike() {
        let email = normalize("From: help@micros0ft.com\n\nhello");
        let signals = extractor().extract(&email);
        assert!(signals.iter().any(|s| s.id == "lookalike_domain"));
    }

    #[test]
    fn test_canonical_subdomain_not_lookalike() {
        let email = normalize("From: no-reply@accounts.google.com\n\nhello");
        let signals = extractor().extract(&email);
        assert!(signals.is_empty());
    }

    #[test]
    fn test_reply_to_mismatch() {
        let email =
            normalize("From: billing@shop.example\nReply-To: collect@freemail.example\n\nhello");
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "reply_to_mismatch");
        assert_eq!(signals[0].severity, Severity::Medium);
    }

    #[test]
    fn test_reply_to_subdomain_allowed() {
        let email = normalize("From: billing@shop.example\nReply-To: help@mail.shop.example\n\nhi");
        let signals = extractor().extract(&email);
        assert!(signals.is_empty());
    }

    #[test]
    fn test_no_sender_no_signals() {
        let email = normalize("just a pasted body with no headers\n\nmore text");
        assert!(extractor().extract(&email).is_empty());
    }
}

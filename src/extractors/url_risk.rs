use super::SignalExtractor;
use crate::lists::ReferenceLists;
use crate::normalizer::NormalizedEmail;
use crate::signal::{Severity, Signal, SignalCategory};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

/// Links hiding behind a bare IP address.
const IP_LITERAL_WEIGHT: f64 = 0.6;
/// Anchor text claims one domain, the href goes somewhere else.
const ANCHOR_MISMATCH_WEIGHT: f64 = 0.6;
/// Known URL-shortener hosts.
const SHORTENER_WEIGHT: f64 = 0.3;
/// Hosts on throwaway TLDs.
const SUSPICIOUS_TLD_WEIGHT: f64 = 0.3;
/// Hosts whose punycode form decodes to non-ASCII.
const PUNYCODE_WEIGHT: f64 = 0.35;
/// Structural anomalies: deep subdomains, very long hosts.
const ANOMALY_WEIGHT: f64 = 0.15;
/// Labels beyond the registrable domain before a host counts as "deep".
const MAX_SUBDOMAIN_DEPTH: usize = 3;
/// Hostname length past which we call the host anomalous.
const MAX_HOST_LEN: usize = 40;

lazy_static! {
    /// A domain-shaped token inside anchor text ("paypal.com", "my.bank.de").
    static ref DOMAIN_IN_TEXT: Regex =
        Regex::new(r"(?i)\b([a-z0-9][a-z0-9-]*(?:\.[a-z0-9][a-z0-9-]*)*\.[a-z]{2,})\b").unwrap();
}

/// Dotted tokens that are file names, not claimed domains.
const NON_DOMAIN_SUFFIXES: [&str; 10] = [
    ".pdf", ".html", ".htm", ".php", ".asp", ".jpg", ".png", ".doc", ".zip", ".exe",
];

/// Inspects every extracted URL and every anchor for the link tricks that
/// dominate real phishing mail.
pub struct UrlRiskExtractor {
    lists: Arc<ReferenceLists>,
}

impl UrlRiskExtractor {
    pub fn new(lists: Arc<ReferenceLists>) -> Self {
        UrlRiskExtractor { lists }
    }
}

/// Last two labels of a hostname: a pragmatic stand-in for the registrable
/// domain that works for the common gTLD case.
fn apex(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        host.to_string()
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

fn host_of(href: &str) -> Option<String> {
    let candidate = if href.contains("://") {
        href.to_string()
    } else {
        format!("http://{href}")
    };
    let parsed = url::Url::parse(&candidate).ok()?;
    parsed.host_str().map(|h| h.to_lowercase())
}

impl SignalExtractor for UrlRiskExtractor {
    fn name(&self) -> &'static str {
        "url_risk"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Url
    }

    fn extract(&self, email: &NormalizedEmail) -> Vec<Signal> {
        let mut signals = Vec::new();

        for url in &email.urls {
            if url.has_ip_host {
                signals.push(
                    Signal::new(
                        "ip_literal_url",
                        SignalCategory::Url,
                        Severity::High,
                        IP_LITERAL_WEIGHT,
                        format!("a link points at the bare IP address {}", url.host),
                    )
                    .from_body(),
                );
            }

            if url.is_shortened {
                signals.push(
                    Signal::new(
                        "url_shortener",
                        SignalCategory::Url,
                        Severity::Medium,
                        SHORTENER_WEIGHT,
                        format!("a link goes through the URL shortener {}", url.host),
                    )
                    .from_body(),
                );
            }

            if let Some(unicode) = &url.punycode_host {
                signals.push(
                    Signal::new(
                        "punycode_url",
                        SignalCategory::Url,
                        Severity::Medium,
                        PUNYCODE_WEIGHT,
                        format!(
                            "the link host {} is punycode for '{unicode}'",
                            url.host
                        ),
                    )
                    .from_body(),
                );
            }

            if !url.has_ip_host {
                if self.lists.has_suspicious_tld(&url.host) {
                    signals.push(
                        Signal::new(
                            "suspicious_tld",
                            SignalCategory::Url,
                            Severity::Medium,
                            SUSPICIOUS_TLD_WEIGHT,
                            format!("the link host {} uses a high-abuse TLD", url.host),
                        )
                        .from_body(),
                    );
                }

                let depth = url.host.split('.').count().saturating_sub(2);
                if depth > MAX_SUBDOMAIN_DEPTH {
                    signals.push(
                        Signal::new(
                            "deep_subdomain",
                            SignalCategory::Url,
                            Severity::Low,
                            ANOMALY_WEIGHT,
                            format!("the link host {} nests {depth} subdomain levels", url.host),
                        )
                        .from_body(),
                    );
                }

                if url.host.len() > MAX_HOST_LEN {
                    signals.push(
                        Signal::new(
                            "long_host",
                            SignalCategory::Url,
                            Severity::Low,
                            ANOMALY_WEIGHT,
                            format!("the link host {} is unusually long", url.host),
                        )
                        .from_body(),
                    );
                }
            }
        }

        for anchor in &email.anchors {
            let Some(claimed) = DOMAIN_IN_TEXT
                .captures(&anchor.text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_lowercase())
            else {
                continue;
            };
            if NON_DOMAIN_SUFFIXES.iter().any(|ext| claimed.ends_with(ext)) {
                continue;
            }
            let Some(actual_host) = host_of(&anchor.href) else {
                continue;
            };
            let claimed_apex = apex(claimed.trim_start_matches("www."));
            let actual_apex = apex(actual_host.trim_start_matches("www."));
            if claimed_apex != actual_apex {
                signals.push(
                    Signal::new(
                        "anchor_mismatch",
                        SignalCategory::Url,
                        Severity::High,
                        ANCHOR_MISMATCH_WEIGHT,
                        format!(
                            "link text shows '{claimed}' but the link goes to '{actual_host}'"
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

    fn extractor() -> UrlRiskExtractor {
        UrlRiskExtractor::new(Arc::new(ReferenceLists::default()))
    }

    fn normalize(raw: &str) -> NormalizedEmail {
        Normalizer::new(Arc::new(ReferenceLists::default())).normalize(raw)
    }

    #[test]
    fn test_ip_literal() {
        let email = normalize("From: a@example.com\n\nGo to http://192.0.2.5/login now");
        let signals = extractor().extract(&email);
        let ip = signals.iter().find(|s| s.id == "ip_literal_url").unwrap();
        assert!(ip.evidence.contains("192.0.2.5"));
        assert!(ip.evidence_from_body);
    }

    #[test]
    fn test_shortener() {
        let email = normalize("From: a@example.com\n\nhttps://bit.ly/3xyzzy");
        let signals = extractor().extract(&email);
        assert!(signals.iter().any(|s| s.id == "url_shortener"));
    }

    #[test]
    fn test_anchor_mismatch() {
        let email = normalize(
            "From: a@example.com\n\n<a href=\"http://192.0.2.5/login\">paypal.com</a>",
        );
        let signals = extractor().extract(&email);
        let m = signals.iter().find(|s| s.id == "anchor_mismatch").unwrap();
        assert!(m.evidence.contains("paypal.com"));
        assert!(m.evidence.contains("192.0.2.5"));
    }

    #[test]
    fn test_anchor_matching_domain_is_fine() {
        let email = normalize(
            "From: a@example.com\n\n<a href=\"https://www.example.com/x\">example.com</a>",
        );
        let signals = extractor().extract(&email);
        assert!(!signals.iter().any(|s| s.id == "anchor_mismatch"));
    }

    #[test]
    fn test_anchor_subdomain_of_claimed_is_fine() {
        let email = normalize(
            "From: a@example.com\n\n<a href=\"https://login.example.com/x\">example.com</a>",
        );
        let signals = extractor().extract(&email);
        assert!(!signals.iter().any(|s| s.id == "anchor_mismatch"));
    }

    #[test]
    fn test_deep_subdomain() {
        let email =
            normalize("From: a@example.com\n\nhttp://a.b.c.d.login.example.com/session");
        let signals = extractor().extract(&email);
        assert!(signals.iter().any(|s| s.id == "deep_subdomain"));
    }

    #[test]
    fn test_suspicious_tld() {
        let email = normalize("From: a@example.com\n\nhttp://win-a-prize.tk/claim");
        let signals = extractor().extract(&email);
        assert!(signals.iter().any(|s| s.id == "suspicious_tld"));
    }

    #[test]
    fn test_plain_url_yields_nothing() {
        let email = normalize("From: a@example.com\n\nDocs at https://docs.example.com/guide");
        assert!(extractor().extract(&email).is_empty());
    }
}

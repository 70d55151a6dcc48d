use serde::{Deserialize, Serialize};

/// Immutable reference data consulted by the signal extractors.
///
/// Built once at process start, shared behind an `Arc`, never mutated
/// afterwards. The built-in defaults cover the common phishing targets; a
/// YAML file can replace any of the lists wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceLists {
    pub brands: Vec<Brand>,
    pub shortener_domains: Vec<String>,
    pub suspicious_tlds: Vec<String>,
    pub urgency_phrases: Vec<String>,
    pub sensitive_keywords: Vec<String>,
    pub generic_greetings: Vec<String>,
    pub payment_request_phrases: Vec<String>,
    pub dangerous_extensions: Vec<String>,
}

/// A brand that phishers commonly impersonate, with the domains the brand
/// legitimately sends from. A sender is only flagged when its domain is
/// outside this canonical set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    pub domains: Vec<String>,
}

impl Brand {
    fn new(name: &str, domains: &[&str]) -> Self {
        Brand {
            name: name.to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl Default for ReferenceLists {
    fn default() -> Self {
        ReferenceLists {
            brands: vec![
                Brand::new("paypal", &["paypal.com", "paypal.co.uk"]),
                Brand::new("google", &["google.com", "gmail.com", "accounts.google.com"]),
                Brand::new("microsoft", &["microsoft.com", "outlook.com", "live.com", "office.com"]),
                Brand::new("apple", &["apple.com", "icloud.com"]),
                Brand::new("amazon", &["amazon.com", "amazon.co.uk", "amazonses.com"]),
                Brand::new("netflix", &["netflix.com"]),
                Brand::new("facebook", &["facebook.com", "facebookmail.com"]),
                Brand::new("instagram", &["instagram.com"]),
                Brand::new("dhl", &["dhl.com", "dhl.de"]),
                Brand::new("fedex", &["fedex.com"]),
                Brand::new("docusign", &["docusign.com", "docusign.net"]),
                Brand::new("chase", &["chase.com"]),
                Brand::new("wellsfargo", &["wellsfargo.com"]),
            ],
            shortener_domains: vec![
                "bit.ly".to_string(),
                "tinyurl.com".to_string(),
                "t.co".to_string(),
                "goo.gl".to_string(),
                "ow.ly".to_string(),
                "is.gd".to_string(),
                "cutt.ly".to_string(),
                "rb.gy".to_string(),
                "buff.ly".to_string(),
                "tiny.cc".to_string(),
            ],
            suspicious_tlds: vec![
                "tk".to_string(),
                "ml".to_string(),
                "ga".to_string(),
                "cf".to_string(),
                "gq".to_string(),
                "zip".to_string(),
                "mov".to_string(),
                "top".to_string(),
                "icu".to_string(),
                "click".to_string(),
            ],
            urgency_phrases: vec![
                "verify your account".to_string(),
                "verify now".to_string(),
                "confirm your identity".to_string(),
                "suspended".to_string(),
                "unusual activity".to_string(),
                "act now".to_string(),
                "action required".to_string(),
                "limited time".to_string(),
                "within 24 hours".to_string(),
                "immediately".to_string(),
                "urgent".to_string(),
                "past due".to_string(),
                "failed delivery".to_string(),
                "your account will be".to_string(),
            ],
            sensitive_keywords: vec![
                "password".to_string(),
                "passphrase".to_string(),
                "social security number".to_string(),
                "ssn".to_string(),
                "card number".to_string(),
                "credit card".to_string(),
                "cvv".to_string(),
                "pin code".to_string(),
                "bank account number".to_string(),
                "security question".to_string(),
            ],
            generic_greetings: vec![
                "dear customer".to_string(),
                "dear user".to_string(),
                "dear member".to_string(),
                "dear account holder".to_string(),
                "dear valued customer".to_string(),
                "dear sir/madam".to_string(),
            ],
            payment_request_phrases: vec![
                "enter your password".to_string(),
                "confirm your password".to_string(),
                "update your payment".to_string(),
                "payment information".to_string(),
                "billing information".to_string(),
                "login to your account".to_string(),
                "sign in to your account".to_string(),
                "provide your credentials".to_string(),
            ],
            dangerous_extensions: vec![
                ".exe".to_string(),
                ".scr".to_string(),
                ".js".to_string(),
                ".jse".to_string(),
                ".vbs".to_string(),
                ".bat".to_string(),
                ".cmd".to_string(),
                ".com".to_string(),
                ".pif".to_string(),
                ".jar".to_string(),
                ".msi".to_string(),
                ".hta".to_string(),
                ".ps1".to_string(),
            ],
        }
    }
}

impl ReferenceLists {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let lists: ReferenceLists = serde_yaml::from_str(&content)?;
        Ok(lists)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Look up the brand a lowercased text mentions, if any. Matches whole
    /// tokens so "purchase confirmation" does not hit "chase".
    pub fn brand_mentioned(&self, text: &str) -> Option<&Brand> {
        self.brands.iter().find(|b| {
            text.split(|c: char| !c.is_alphanumeric())
                .any(|token| token == b.name)
        })
    }

    pub fn is_shortener(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.shortener_domains
            .iter()
            .any(|s| host == *s || host.ends_with(&format!(".{s}")))
    }

    pub fn has_suspicious_tld(&self, host: &str) -> bool {
        match host.rsplit('.').next() {
            Some(tld) => self
                .suspicious_tlds
                .iter()
                .any(|t| tld.eq_ignore_ascii_case(t)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists_are_populated() {
        let lists = ReferenceLists::default();
        assert!(!lists.brands.is_empty());
        assert!(!lists.shortener_domains.is_empty());
        assert!(!lists.urgency_phrases.is_empty());
    }

    #[test]
    fn test_shortener_lookup() {
        let lists = ReferenceLists::default();
        assert!(lists.is_shortener("bit.ly"));
        assert!(lists.is_shortener("BIT.LY"));
        assert!(!lists.is_shortener("example.com"));
    }

    #[test]
    fn test_suspicious_tld() {
        let lists = ReferenceLists::default();
        assert!(lists.has_suspicious_tld("login.example.tk"));
        assert!(!lists.has_suspicious_tld("example.com"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let lists = ReferenceLists::default();
        let yaml = serde_yaml::to_string(&lists).unwrap();
        let parsed: ReferenceLists = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.brands.len(), lists.brands.len());
        assert_eq!(parsed.urgency_phrases, lists.urgency_phrases);
    }

    #[test]
    fn test_brand_mentioned() {
        let lists = ReferenceLists::default();
        assert!(lists.brand_mentioned("paypal support team").is_some());
        assert!(lists.brand_mentioned("weekly newsletter").is_none());
        // Token match only: no brand inside a longer word
        assert!(lists.brand_mentioned("purchase confirmation").is_none());
    }
}

use serde::{Deserialize, Serialize};

/// One category per extractor; the aggregator combines within a category
/// before combining across categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Authentication,
    Url,
    Language,
    SenderSpoof,
    Attachment,
    Structure,
}

impl SignalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Authentication => "authentication",
            SignalCategory::Url => "url",
            SignalCategory::Language => "language",
            SignalCategory::SenderSpoof => "sender_spoof",
            SignalCategory::Attachment => "attachment",
            SignalCategory::Structure => "structure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single piece of extracted evidence.
///
/// `weight` is in [-1, 1]; negative weights are mitigating (trust) signals.
/// `evidence` holds the literal fact that fired the signal, so every score is
/// traceable back to something concrete in the email.
#[derive(Debug, Clone)]
pub struct Signal {
    pub id: &'static str,
    pub category: SignalCategory,
    pub severity: Severity,
    pub weight: f64,
    pub evidence: String,
    /// True when `evidence` echoes raw body text. Drives redaction when the
    /// submitter did not consent to sharing the body.
    pub evidence_from_body: bool,
}

impl Signal {
    pub fn new(
        id: &'static str,
        category: SignalCategory,
        severity: Severity,
        weight: f64,
        evidence: impl Into<String>,
    ) -> Self {
        Signal {
            id,
            category,
            severity,
            weight: weight.clamp(-1.0, 1.0),
            evidence: evidence.into(),
            evidence_from_body: false,
        }
    }

    pub fn from_body(mut self) -> Self {
        self.evidence_from_body = true;
        self
    }

    pub fn is_mitigating(&self) -> bool {
        self.weight < 0.0
    }
}

/// Emitted in place of a category's findings when its extractor died on
/// adversarial input. Low severity: the analysis is degraded, not damning.
pub const ANALYSIS_INCOMPLETE_ID: &str = "analysis_incomplete";
pub const ANALYSIS_INCOMPLETE_WEIGHT: f64 = 0.05;

pub fn analysis_incomplete(extractor_name: &str, category: SignalCategory) -> Signal {
    Signal::new(
        ANALYSIS_INCOMPLETE_ID,
        category,
        Severity::Low,
        ANALYSIS_INCOMPLETE_WEIGHT,
        format!("the {extractor_name} check did not complete"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_is_clamped() {
        let s = Signal::new("x", SignalCategory::Url, Severity::High, 3.0, "e");
        assert_eq!(s.weight, 1.0);
        let s = Signal::new("x", SignalCategory::Url, Severity::High, -3.0, "e");
        assert_eq!(s.weight, -1.0);
    }

    #[test]
    fn test_mitigating_detection() {
        let s = Signal::new("t", SignalCategory::Authentication, Severity::Low, -0.2, "e");
        assert!(s.is_mitigating());
        let s = Signal::new("t", SignalCategory::Url, Severity::High, 0.6, "e");
        assert!(!s.is_mitigating());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&SignalCategory::SenderSpoof).unwrap();
        assert_eq!(json, "\"sender_spoof\"");
    }
}

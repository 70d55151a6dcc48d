use serde::{Deserialize, Serialize};

/// Scores at or above this are at least "medium".
pub const MEDIUM_THRESHOLD: f64 = 0.45;
/// Scores at or above this are "high".
pub const HIGH_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Low,
    Medium,
    High,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Low => "low",
            Verdict::Medium => "medium",
            Verdict::High => "high",
        }
    }
}

/// Pure thresholding; the only way a verdict is ever produced.
pub fn map_verdict(score: f64) -> Verdict {
    if score >= HIGH_THRESHOLD {
        Verdict::High
    } else if score >= MEDIUM_THRESHOLD {
        Verdict::Medium
    } else {
        Verdict::Low
    }
}

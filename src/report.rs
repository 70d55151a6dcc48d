use crate::aggregator::Breakdown;
use crate::signal::{Severity, Signal, SignalCategory};
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};

/// Decimal places kept in the response score. Display rounding only; the
/// verdict is always derived from the raw aggregate.
const SCORE_DECIMALS: i32 = 3;

/// One entry of the per-signal breakdown returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDetail {
    pub id: String,
    pub category: SignalCategory,
    pub severity: Severity,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// The full response contract of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: f64,
    pub verdict: Verdict,
    pub feedback: Vec<String>,
    pub details: Vec<SignalDetail>,
}

/// Package score, verdict, feedback and details.
///
/// When the submitter did not consent to sharing the body
/// (`share_body == false`), evidence that echoes body text is dropped;
/// category, severity and weight always stay. Privacy contract, not a
/// scoring one: the score is identical either way.
pub fn assemble(
    breakdown: &Breakdown,
    verdict: Verdict,
    feedback: Vec<String>,
    signals: Vec<Signal>,
    share_body: bool,
) -> AnalysisResult {
    let factor = 10f64.powi(SCORE_DECIMALS);
    let details = signals
        .into_iter()
        .map(|signal| {
            let evidence = if signal.evidence_from_body && !share_body {
                None
            } else {
                Some(signal.evidence)
            };
            SignalDetail {
                id: signal.id.to_string(),
                category: signal.category,
                severity: signal.severity,
                weight: signal.weight,
                evidence,
            }
        })
        .collect();

    AnalysisResult {
        score: (breakdown.score * factor).round() / factor,
        verdict,
        feedback,
        details,
    }
}

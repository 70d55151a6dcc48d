use crate::signal::{Signal, SignalCategory};
use std::collections::HashMap;

/// Ceiling on any single category's contribution. Repeated weak evidence in
/// one category saturates here instead of reaching certainty.
pub const CATEGORY_CEILING: f64 = 0.9;
/// Fraction of the non-dominant categories' scores added on top of the
/// dominant one.
pub const RESIDUAL_FRACTION: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct Breakdown {
    pub score: f64,
    /// Per-category contributions, highest first. Drives feedback ordering.
    pub category_scores: Vec<(SignalCategory, f64)>,
}

/// Combine all fired signals into one risk score in [0, 1].
///
/// Within a category, positive weights combine as a saturating sum
/// `1 - prod(1 - w)`, capped at `CATEGORY_CEILING`. Across categories the
/// highest score dominates and the rest contribute `RESIDUAL_FRACTION` of
/// their sum, so a flood of low-grade evidence cannot impersonate one
/// decisive finding. Mitigating (negative) weights subtract from the final
/// aggregate, never below zero.
pub fn aggregate(signals: &[Signal]) -> Breakdown {
    let mut survival: HashMap<SignalCategory, f64> = HashMap::new();
    let mut mitigation = 0.0;

    for signal in signals {
        if signal.is_mitigating() {
            mitigation += -signal.weight;
        } else {
            let entry = survival.entry(signal.category).or_insert(1.0);
            *entry *= 1.0 - signal.weight;
        }
    }

    let mut category_scores: Vec<(SignalCategory, f64)> = survival
        .into_iter()
        .map(|(cat, surviving)| (cat, (1.0 - surviving).min(CATEGORY_CEILING)))
        .filter(|(_, score)| *score > 0.0)
        .collect();
    // Deterministic order: by score, ties broken by category name
    category_scores.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.as_str().cmp(b.0.as_str()))
    });

    let score = match category_scores.split_first() {
        None => 0.0,
        Some(((_, dominant), rest)) => {
            let residual: f64 = rest.iter().map(|(_, s)| s).sum();
            dominant + RESIDUAL_FRACTION * residual
        }
    };

    Breakdown {
        score: (score - mitigation).clamp(0.0, 1.0),
        category_scores,
    }
}

use crate::aggregator::Breakdown;
use crate::signal::Signal;
use std::collections::HashSet;

/// Shown when nothing fired at all.
const REASSURANCE: &str = "No strong phishing indicators were found in this email.";

/// Turn fired signals into explanation lines: one line per category, worded
/// from that category's highest-severity signal, ordered by the category's
/// contribution to the final score, duplicates removed.
pub fn generate(signals: &[Signal], breakdown: &Breakdown) -> Vec<String> {
    let mut lines = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (category, _) in &breakdown.category_scores {
        let top = signals
            .iter()
            .filter(|s| s.category == *category && !s.is_mitigating())
            .max_by(|a, b| {
                a.severity.cmp(&b.severity).then(
                    a.weight
                        .partial_cmp(&b.weight)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
            });
        if let Some(signal) = top {
            let line = sentence(&signal.evidence);
            if seen.insert(line.clone()) {
                lines.push(line);
            }
        }
    }

    if lines.is_empty() {
        if let Some(trust) = signals.iter().find(|s| s.is_mitigating()) {
            lines.push(sentence(&trust.evidence));
        }
    }
    if lines.is_empty() {
        lines.push(REASSURANCE.to_string());
    }

    lines
}

/// Evidence clauses are lowercase facts; present them as sentences.
fn sentence(evidence: &str) -> String {
    let mut chars = evidence.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => return REASSURANCE.to_string(),
    };
    if capitalized.ends_with(['.', '!', '?']) {
        capitalized
    } else {
        format!("{capitalized}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::signal::{Severity, Signal, SignalCategory};

    fn run(signals: Vec<Signal>) -> Vec<String> {
        let breakdown = aggregate(&signals);
        generate(&signals, &breakdown)
    }

    #[test]
    fn test_no_signals_reassures() {
        let lines = run(vec![]);
        assert_eq!(lines, vec![REASSURANCE.to_string()]);
    }

    #[test]
    fn test_one_line_per_category_highest_severity_wins() {
        let signals = vec![
            Signal::new(
                "deep_subdomain",
                SignalCategory::Url,
                Severity::Low,
                0.15,
                "the link host nests many subdomain levels",
            ),
            Signal::new(
                "ip_literal_url",
                SignalCategory::Url,
                Severity::High,
                0.6,
                "a link points at the bare IP address 192.0.2.5",
            ),
        ];
        let lines = run(signals);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("192.0.2.5"));
    }

    #[test]
    fn test_ordered_by_category_contribution() {
        let signals = vec![
            Signal::new(
                "urgency_phrase",
                SignalCategory::Language,
                Severity::Low,
                0.15,
                "pressure wording \"act now\"",
            ),
            Signal::new(
                "lookalike_domain",
                SignalCategory::SenderSpoof,
                Severity::High,
                0.65,
                "sender domain 'paypa1-secure.com' is a look-alike of 'paypal.com'",
            ),
        ];
        let lines = run(signals);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("look-alike"));
        assert!(lines[1].contains("act now"));
    }

    #[test]
    fn test_duplicate_lines_removed() {
        let signals = vec![
            Signal::new("a", SignalCategory::Url, Severity::High, 0.5, "same words"),
            Signal::new("b", SignalCategory::Language, Severity::High, 0.5, "same words"),
        ];
        let lines = run(signals);
        assert_eq!(lines, vec!["Same words.".to_string()]);
    }

    #[test]
    fn test_only_mitigating_signal_gets_its_own_line() {
        let signals = vec![Signal::new(
            "authentication_trusted",
            SignalCategory::Authentication,
            Severity::Low,
            -0.2,
            "SPF, DKIM and DMARC all passed for the sender",
        )];
        let lines = run(signals);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("DMARC"));
    }

    #[test]
    fn test_sentences_are_capitalized_and_terminated() {
        let signals = vec![Signal::new(
            "x",
            SignalCategory::Structure,
            Severity::Medium,
            0.4,
            "the body mentions \"password\"",
        )];
        let lines = run(signals);
        assert_eq!(lines[0], "The body mentions \"password\".");
    }
}

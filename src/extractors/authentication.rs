use super::SignalExtractor;
use crate::normalizer::NormalizedEmail;
use crate::signal::{Severity, Signal, SignalCategory};

/// Weight of each explicit authentication failure (SPF, DKIM, DMARC).
const FAIL_WEIGHT: f64 = 0.5;
/// Weight of an SPF softfail, which senders use for "suspicious but unsure".
const SOFTFAIL_WEIGHT: f64 = 0.25;
/// Mitigating weight when SPF, DKIM and DMARC all pass.
const ALL_PASS_TRUST: f64 = -0.2;

/// Reads `Authentication-Results` (and friends) left by the receiving MTA.
///
/// Absent headers yield no signal at all: a missing verdict is not evidence
/// of forgery, many submitted emails are pasted without their full headers.
pub struct AuthenticationExtractor;

impl AuthenticationExtractor {
    fn auth_text(email: &NormalizedEmail) -> String {
        let mut text = String::new();
        for name in [
            "authentication-results",
            "arc-authentication-results",
            "received-spf",
        ] {
            for value in email.header_values(name) {
                text.push_str(&value.to_lowercase());
                text.push(' ');
            }
        }
        text
    }
}

impl SignalExtractor for AuthenticationExtractor {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Authentication
    }

    fn extract(&self, email: &NormalizedEmail) -> Vec<Signal> {
        let auth = Self::auth_text(email);
        if auth.is_empty() {
            return Vec::new();
        }

        let mut signals = Vec::new();

        let spf_fail = auth.contains("spf=fail")
            || email
                .header_values("received-spf")
                .iter()
                .any(|v| v.to_lowercase().starts_with("fail"));
        if spf_fail {
            signals.push(Signal::new(
                "spf_fail",
                SignalCategory::Authentication,
                Severity::High,
                FAIL_WEIGHT,
                "the receiving server reported an SPF failure for the sender",
            ));
        } else if auth.contains("spf=softfail") {
            signals.push(Signal::new(
                "spf_softfail",
                SignalCategory::Authentication,
                Severity::Medium,
                SOFTFAIL_WEIGHT,
                "the receiving server reported an SPF softfail for the sender",
            ));
        }

        if auth.contains("dkim=fail") {
            signals.push(Signal::new(
                "dkim_fail",
                SignalCategory::Authentication,
                Severity::High,
                FAIL_WEIGHT,
                "the message carries a DKIM signature that failed verification",
            ));
        }

        if auth.contains("dmarc=fail") {
            signals.push(Signal::new(
                "dmarc_fail",
                SignalCategory::Authentication,
                Severity::High,
                FAIL_WEIGHT,
                "the sender domain's DMARC policy check failed",
            ));
        }

        let all_pass = auth.contains("spf=pass")
            && auth.contains("dkim=pass")
            && auth.contains("dmarc=pass");
        if all_pass && signals.is_empty() {
            signals.push(Signal::new(
                "authentication_trusted",
                SignalCategory::Authentication,
                Severity::Low,
                ALL_PASS_TRUST,
                "SPF, DKIM and DMARC all passed for the sender",
            ));
        }

        signals
    }
}

use super::SignalExtractor;
use crate::lists::ReferenceLists;
use crate::normalizer::NormalizedEmail;
use crate::signal::{Severity, Signal, SignalCategory};
use std::sync::Arc;

/// An attachment with an executable or script extension.
const DANGEROUS_EXTENSION_WEIGHT: f64 = 0.6;
/// A document extension hiding an executable one (`invoice.pdf.exe`).
const DOUBLE_EXTENSION_WEIGHT: f64 = 0.65;

/// Document-ish extensions that attackers use as the visible half of a
/// double extension.
const DECOY_EXTENSIONS: [&str; 8] = [
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".txt", ".jpg", ".png",
];

/// Judges announced attachment filenames; the engine never opens content.
pub struct AttachmentExtractor {
    lists: Arc<ReferenceLists>,
}

impl AttachmentExtractor {
    pub fn new(lists: Arc<ReferenceLists>) -> Self {
        AttachmentExtractor { lists }
    }

    fn dangerous_extension(&self, name: &str) -> Option<&str> {
        self.lists
            .dangerous_extensions
            .iter()
            .find(|ext| name.ends_with(ext.as_str()))
            .map(|s| s.as_str())
    }
}

impl SignalExtractor for AttachmentExtractor {
    fn name(&self) -> &'static str {
        "attachment"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Attachment
    }

    fn extract(&self, email: &NormalizedEmail) -> Vec<Signal> {
        let mut signals = Vec::new();

        for name in &email.attachment_names {
            let lower = name.to_lowercase();
            let Some(ext) = self.dangerous_extension(&lower) else {
                continue;
            };

            let stem = &lower[..lower.len() - ext.len()];
            let is_double = DECOY_EXTENSIONS.iter().any(|decoy| stem.ends_with(decoy));

            if is_double {
                signals.push(Signal::new(
                    "double_extension_attachment",
                    SignalCategory::Attachment,
                    Severity::High,
                    DOUBLE_EXTENSION_WEIGHT,
                    format!("attachment '{name}' disguises {ext} behind a document extension"),
                ));
            } else {
                signals.push(Signal::new(
                    "dangerous_attachment",
                    SignalCategory::Attachment,
                    Severity::High,
                    DANGEROUS_EXTENSION_WEIGHT,
                    format!("attachment '{name}' has the executable extension {ext}"),
                ));
            }
        }

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;

    fn extractor() -> AttachmentExtractor {
        AttachmentExtractor::new(Arc::new(ReferenceLists::default()))
    }

    fn normalize(raw: &str) -> NormalizedEmail {
        Normalizer::new(Arc::new(ReferenceLists::default())).normalize(raw)
    }

    #[test]
    fn test_executable_attachment() {
        let email = normalize(
            "From: a@example.com\n\nContent-Disposition: attachment; filename=\"setup.exe\"\n\nx",
        );
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "dangerous_attachment");
        assert_eq!(signals[0].severity, Severity::High);
    }

    #[test]
    fn test_double_extension() {
        let email = normalize(
            "From: a@example.com\n\nContent-Disposition: attachment; filename=\"invoice.pdf.exe\"\n\nx",
        );
        let signals = extractor().extract(&email);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "double_extension_attachment");
        assert!(signals[0].evidence.contains("invoice.pdf.exe"));
    }

    #[test]
    fn test_document_attachment_is_fine() {
        let email = normalize(
            "From: a@example.com\n\nContent-Disposition: attachment; filename=\"report.pdf\"\n\nx",
        );
        assert!(extractor().extract(&email).is_empty());
    }

    #[test]
    fn test_no_attachments_no_signals() {
        let email = normalize("From: a@example.com\n\njust text");
        assert!(extractor().extract(&email).is_empty());
    }
}

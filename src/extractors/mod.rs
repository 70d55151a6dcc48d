//! Signal extractors: independent analyzers that each inspect one category
//! of evidence. None depends on another's output, so the engine may run them
//! in any order or concurrently.

pub mod attachment;
pub mod authentication;
pub mod language;
pub mod sender_spoof;
pub mod structure;
pub mod url_risk;

use crate::lists::ReferenceLists;
use crate::normalizer::NormalizedEmail;
use crate::signal::{Signal, SignalCategory};
use std::sync::Arc;

/// One analyzer per evidence category. Implementations are pure functions of
/// the normalized email: no I/O, no shared mutable state, no ordering
/// requirements between extractors.
pub trait SignalExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn category(&self) -> SignalCategory;
    fn extract(&self, email: &NormalizedEmail) -> Vec<Signal>;
}

/// The default extractor set, built once at process start. Adding an
/// extractor means appending here; there is no dispatch hierarchy.
pub fn default_extractors(lists: Arc<ReferenceLists>) -> Vec<Arc<dyn SignalExtractor>> {
    vec![
        Arc::new(authentication::AuthenticationExtractor),
        Arc::new(sender_spoof::SenderSpoofExtractor::new(lists.clone())),
        Arc::new(url_risk::UrlRiskExtractor::new(lists.clone())),
        Arc::new(language::LanguageExtractor::new(lists.clone())),
        Arc::new(structure::StructureExtractor::new(lists.clone())),
        Arc::new(attachment::AttachmentExtractor::new(lists)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;

    #[test]
    fn test_default_set_covers_every_category() {
        let lists = Arc::new(ReferenceLists::default());
        let extractors = default_extractors(lists);
        assert_eq!(extractors.len(), 6);
        let categories: Vec<_> = extractors.iter().map(|e| e.category()).collect();
        for cat in [
            SignalCategory::Authentication,
            SignalCategory::SenderSpoof,
            SignalCategory::Url,
            SignalCategory::Language,
            SignalCategory::Structure,
            SignalCategory::Attachment,
        ] {
            assert!(categories.contains(&cat), "missing {cat:?}");
        }
    }

    #[test]
    fn test_empty_email_yields_no_signals() {
        let lists = Arc::new(ReferenceLists::default());
        let email = Normalizer::new(lists.clone()).normalize("");
        for extractor in default_extractors(lists) {
            assert!(
                extractor.extract(&email).is_empty(),
                "{} fired on empty input",
                extractor.name()
            );
        }
    }
}

use crate::aggregator::aggregate;
use crate::error::EngineError;
use crate::extractors::{default_extractors, SignalExtractor};
use crate::feedback;
use crate::lists::ReferenceLists;
use crate::normalizer::Normalizer;
use crate::report::{assemble, AnalysisResult};
use crate::signal::analysis_incomplete;
use crate::verdict::map_verdict;
use std::sync::Arc;

/// The risk-scoring engine: a stateless function of its input.
///
/// Holds only immutable data built at startup (reference lists, compiled
/// patterns, the extractor set), so one instance can serve any number of
/// concurrent analyses without coordination.
pub struct AnalysisEngine {
    normalizer: Normalizer,
    extractors: Vec<Arc<dyn SignalExtractor>>,
}

impl AnalysisEngine {
    pub fn new(lists: Arc<ReferenceLists>) -> Self {
        let extractors = default_extractors(lists.clone());
        AnalysisEngine {
            normalizer: Normalizer::new(lists),
            extractors,
        }
    }

    /// Same engine with a caller-chosen extractor set. Used by tests and by
    /// anyone embedding the engine with extra extractors appended.
    pub fn with_extractors(
        lists: Arc<ReferenceLists>,
        extractors: Vec<Arc<dyn SignalExtractor>>,
    ) -> Self {
        AnalysisEngine {
            normalizer: Normalizer::new(lists),
            extractors,
        }
    }

    /// Run one full analysis: normalize, fan the extractors out, join, score.
    ///
    /// Extractors run as independent tasks; one dying on adversarial input is
    /// recorded as an `analysis_incomplete` signal and the rest of the
    /// analysis completes. Aggregation invariant violations fail closed.
    pub async fn analyze(
        &self,
        email_text: &str,
        share_body: bool,
    ) -> Result<AnalysisResult, EngineError> {
        if email_text.trim().is_empty() {
            return Err(EngineError::EmptyEmail);
        }

        let email = Arc::new(self.normalizer.normalize(email_text));
        log::debug!(
            "normalized email: {} headers, {} urls, {} anchors, {} attachments",
            email.headers.len(),
            email.urls.len(),
            email.anchors.len(),
            email.attachment_names.len()
        );

        let mut handles = Vec::with_capacity(self.extractors.len());
        for extractor in &self.extractors {
            let extractor = Arc::clone(extractor);
            let email = Arc::clone(&email);
            let name = extractor.name();
            let category = extractor.category();
            handles.push((
                name,
                category,
                tokio::spawn(async move { extractor.extract(&email) }),
            ));
        }

        let mut signals = Vec::new();
        for (name, category, handle) in handles {
            match handle.await {
                Ok(extracted) => {
                    if !extracted.is_empty() {
                        log::debug!("extractor {name} fired {} signal(s)", extracted.len());
                    }
                    signals.extend(extracted);
                }
                Err(err) if err.is_panic() => {
                    log::warn!("extractor {name} failed on this input; continuing without it");
                    signals.push(analysis_incomplete(name, category));
                }
                Err(err) => {
                    return Err(EngineError::Internal(format!(
                        "extractor task '{name}' was cancelled: {err}"
                    )));
                }
            }
        }

        let breakdown = aggregate(&signals);
        if !breakdown.score.is_finite() || !(0.0..=1.0).contains(&breakdown.score) {
            return Err(EngineError::Internal(format!(
                "aggregate score {} outside [0,1]",
                breakdown.score
            )));
        }

        let verdict = map_verdict(breakdown.score);
        let feedback = feedback::generate(&signals, &breakdown);
        log::info!(
            "analysis complete: score {:.3}, verdict {}, {} signal(s)",
            breakdown.score,
            verdict.as_str(),
            signals.len()
        );

        Ok(assemble(&breakdown, verdict, feedback, signals, share_body))
    }
}

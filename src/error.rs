use thiserror::Error;

/// Failures the engine reports to its caller.
///
/// Extractor-level failures are not here on purpose: they are isolated per
/// extractor and degrade into an `analysis_incomplete` signal instead of
/// aborting the analysis. Aggregation and assembly failures fail closed; a
/// partially-correct score would be worse than an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The submission had no content to analyze. Reported as HTTP 400.
    #[error("submitted email is empty")]
    EmptyEmail,

    /// A scoring or assembly invariant was violated. Reported as HTTP 500;
    /// the detail is logged, never sent to the caller.
    #[error("internal analysis failure: {0}")]
    Internal(String),
}

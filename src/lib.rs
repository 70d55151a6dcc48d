pub mod aggregator;
pub mod api;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod feedback;
pub mod lists;
pub mod normalizer;
pub mod report;
pub mod signal;
pub mod verdict;

pub use api::{build_router, AppState};
pub use engine::AnalysisEngine;
pub use error::EngineError;
pub use lists::ReferenceLists;
pub use normalizer::{NormalizedEmail, Normalizer};
pub use report::AnalysisResult;
pub use signal::{Severity, Signal, SignalCategory};
pub use verdict::Verdict;

//! Static-analysis collaborator for the Sentinel pipeline.
//!
//! The dispatcher only depends on the [`Analyzer`] contract; the production
//! implementation shells out to an external parser binary and captures its
//! report. The analysis algorithms themselves live entirely in that binary.

mod error;
mod external;

pub use error::AnalysisError;
pub use error::Result;
pub use external::AnalysisConfig;
pub use external::ExternalParserAnalyzer;

use std::path::Path;

/// Output of a single-file analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOutput {
    /// Raw report text emitted by the analysis backend.
    pub report: String,
}

/// Contract between the change dispatcher and the static-analysis backend.
pub trait Analyzer: Send {
    fn analyze_file(&self, path: &Path) -> Result<AnalysisOutput>;
}

/// Analyzer that does nothing. Used for watch-only wiring and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalyzer;

impl Analyzer for NullAnalyzer {
    fn analyze_file(&self, _path: &Path) -> Result<AnalysisOutput> {
        Ok(AnalysisOutput::default())
    }
}

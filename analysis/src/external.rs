use crate::AnalysisOutput;
use crate::Analyzer;
use crate::error::AnalysisError;
use crate::error::Result;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Configuration for the external parser invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Parser binary to run for each accepted file.
    #[serde(default = "default_parser_bin")]
    pub parser_bin: PathBuf,

    /// Working directory for the parser process.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_parser_bin() -> PathBuf {
    PathBuf::from("tree_sitter_parser")
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parser_bin: default_parser_bin(),
            working_dir: None,
        }
    }
}

/// Analyzer that runs an external parser binary and captures its report.
#[derive(Debug, Clone)]
pub struct ExternalParserAnalyzer {
    config: AnalysisConfig,
}

impl ExternalParserAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl Analyzer for ExternalParserAnalyzer {
    fn analyze_file(&self, path: &Path) -> Result<AnalysisOutput> {
        debug!("analyzing {}", path.display());
        let mut command = Command::new(&self.config.parser_bin);
        command.arg(path);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        let output = command.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return match output.status.code() {
                Some(status) => Err(AnalysisError::ParserFailed { status, stderr }),
                None => Err(AnalysisError::ParserKilled),
            };
        }
        Ok(AnalysisOutput {
            report: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

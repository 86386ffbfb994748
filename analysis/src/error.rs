use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parser exited with status {status}: {stderr}")]
    ParserFailed { status: i32, stderr: String },

    #[error("parser terminated by signal")]
    ParserKilled,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

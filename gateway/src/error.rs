use crate::engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The underlying model call failed. The gateway stays usable; the
    /// caller decides whether to retry.
    #[error("inference failed: {0}")]
    Inference(#[from] EngineError),

    #[error("malformed feedback identifier: {0:?}")]
    MalformedFeedback(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

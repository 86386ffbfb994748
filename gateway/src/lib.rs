//! Single-flight AI inference gateway.
//!
//! The gateway routes every prompt through the conversation router first and
//! only reaches for the underlying model when the input is a technical
//! request. Exactly one inference runs at any instant; all callers serialize
//! on one lock because the engine is a shared, expensive resource that is
//! not safe for concurrent calls. Code submitted as context is parsed for
//! structure, folded into the learning store, and serialized into the
//! bounded prompt together with recent conversation turns and feedback
//! statistics.

mod code_context;
mod engine;
mod error;
mod gateway;
mod learning;

pub use code_context::CodeContextEntry;
pub use code_context::CodeEntity;
pub use code_context::ConstructKind;
pub use code_context::NamingObservation;
pub use code_context::NamingStyle;
pub use code_context::parse_code_context;
pub use engine::EngineConfig;
pub use engine::EngineError;
pub use engine::InferenceEngine;
pub use engine::OllamaEngine;
pub use error::GatewayError;
pub use error::Result;
pub use gateway::AiGateway;
pub use gateway::AskReply;
pub use gateway::CodeSubmission;
pub use gateway::GatewayConfig;
pub use gateway::GatewayStats;
pub use learning::FeedbackRecord;
pub use learning::LearningStore;

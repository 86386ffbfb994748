//! Conversation-intent routing for the Sentinel gateway.
//!
//! Free-text input is classified into an intent by an ordered rule list and
//! either answered immediately with a templated response or flagged as a
//! technical request that needs a full model inference. The router owns the
//! conversational context and appends every processed input to it before
//! classification, so the current turn is already history for later turns.

mod context;
mod intent;
mod response;
mod router;

pub use context::ConversationContext;
pub use context::ConversationTurn;
pub use context::UserPreferences;
pub use intent::Intent;
pub use intent::IntentClassifier;
pub use response::RouterResponse;
pub use router::ConversationRouter;

/// Category attached to every technical intent. The keyword rules only
/// recognize debugging-flavored requests today.
pub const TECHNICAL_CATEGORY_DEBUGGING: &str = "debugging";

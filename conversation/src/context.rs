use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// One processed user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub user_name: Option<String>,
}

/// Stated preferences collected over the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub frameworks: Vec<String>,
    pub tech_stack: Vec<String>,
}

/// Mutable conversational state owned by the router. A clone of this struct
/// is what technical responses carry into prompt assembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub current_task: Option<String>,
    pub user_name: Option<String>,
    pub history: Vec<ConversationTurn>,
    pub preferences: UserPreferences,
}

impl ConversationContext {
    /// Append a user input to the history. Called for every processed input,
    /// before classification.
    pub fn record(&mut self, user_text: &str) {
        self.history.push(ConversationTurn {
            timestamp: Utc::now(),
            user_text: user_text.to_string(),
            user_name: self.user_name.clone(),
        });
    }

    /// Display name for templated responses.
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("there")
    }
}

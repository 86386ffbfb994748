use crate::context::ConversationContext;
use crate::intent::Intent;
use crate::intent::IntentClassifier;
use crate::response::RouterResponse;
use tracing::debug;

const FRONTEND_FRAMEWORKS: &[&str] = &["React", "Vue", "Angular", "Svelte"];

/// Classify-then-route over each input plus the ongoing context.
#[derive(Default)]
pub struct ConversationRouter {
    context: ConversationContext,
    classifier: IntentClassifier,
}

impl ConversationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session-opening message. Asks for the user's name; the caller feeds
    /// the answer back through [`ConversationRouter::set_user_name`].
    pub fn welcome(&self) -> RouterResponse {
        RouterResponse::Welcome {
            message: "Hello! I'm your AI programming assistant. I can help with \
                      coding, debugging, and other development tasks. May I know \
                      your name?"
                .to_string(),
        }
    }

    pub fn set_user_name(&mut self, name: &str) -> RouterResponse {
        self.context.user_name = Some(name.trim().to_string());
        RouterResponse::Greeting {
            message: format!(
                "It's great to meet you, {name}! I can assist with coding and \
                 debugging, suggest improvements, and monitor your code for \
                 potential issues. What would you like to work on today?",
                name = name.trim()
            ),
        }
    }

    /// Process one input: record it, classify it, route it. The input is
    /// appended to the history before classification, so the technical
    /// context snapshot includes the current turn.
    pub fn process(&mut self, input: &str) -> RouterResponse {
        self.context.record(input);
        let intent = self.classifier.classify(input);
        debug!("classified input as {intent:?}");
        match intent {
            Intent::Greeting => RouterResponse::Greeting {
                message: format!(
                    "Hello again, {}! How can I help you today?",
                    self.context.display_name()
                ),
            },
            Intent::Farewell => RouterResponse::Farewell {
                message: format!(
                    "Goodbye, {}! Feel free to come back whenever you need a hand.",
                    self.context.display_name()
                ),
            },
            Intent::Technical { category } => RouterResponse::Technical {
                category,
                context: self.context.clone(),
            },
            Intent::TaskSwitch { area } => self.handle_task_switch(area),
            Intent::General => RouterResponse::Conversation {
                message: self.general_reply(),
            },
        }
    }

    fn handle_task_switch(&mut self, area: String) -> RouterResponse {
        self.context.current_task = Some(area.clone());
        match area.as_str() {
            "frontend" => RouterResponse::TaskSwitch {
                area,
                message: "Would you like to use a specific frontend framework? \
                          I can suggest one based on your project requirements."
                    .to_string(),
                suggestions: FRONTEND_FRAMEWORKS
                    .iter()
                    .map(|framework| framework.to_string())
                    .collect(),
            },
            "backend" => RouterResponse::TaskSwitch {
                area,
                message: "For the backend, what are your main requirements? \
                          Performance, scalability, ease of development?"
                    .to_string(),
                suggestions: Vec::new(),
            },
            _ => RouterResponse::Clarification {
                message: "Could you tell me more about what you'd like to work on?"
                    .to_string(),
            },
        }
    }

    fn general_reply(&self) -> String {
        let name = self.context.display_name();
        match &self.context.current_task {
            None => format!(
                "What would you like to work on, {name}? I can help with \
                 frontend, backend, or any other part of your project."
            ),
            Some(task) => format!(
                "I'm here to help with your {task} work, {name}. What specific \
                 aspect would you like to discuss?"
            ),
        }
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn current_task(&self) -> Option<&str> {
        self.context.current_task.as_deref()
    }

    /// Forget the recorded turns. The user name, current task, and stated
    /// preferences survive; only the history is conversational state.
    pub fn clear(&mut self) {
        self.context.history.clear();
    }
}

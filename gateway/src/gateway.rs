use crate::code_context::CodeContextEntry;
use crate::code_context::ConstructKind;
use crate::code_context::NamingStyle;
use crate::code_context::parse_code_context;
use crate::engine::InferenceEngine;
use crate::error::GatewayError;
use crate::error::Result;
use crate::learning::FeedbackRecord;
use crate::learning::LearningStore;
use chrono::DateTime;
use chrono::Utc;
use sentinel_conversation::ConversationContext;
use sentinel_conversation::ConversationRouter;
use sentinel_conversation::RouterResponse;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Gateway tuning knobs. The sampling parameters are fixed per gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    /// How many recent exchanges the bounded prompt carries.
    pub history_window: usize,
    pub system_preamble: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            history_window: 3,
            system_preamble: "You are an expert programming assistant. You help with \
                              code generation, explanation, and debugging."
                .to_string(),
        }
    }
}

/// Source submitted as context for a question.
#[derive(Debug, Clone)]
pub struct CodeSubmission {
    pub filename: String,
    pub code: String,
}

/// Successful outcome of `ask`. `suggestion_id` is set only when the text
/// came from the model; feedback refers back to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskReply {
    pub text: String,
    pub suggestion_id: Option<String>,
}

/// Snapshot of gateway state for the `stats` command and tests.
#[derive(Debug, Clone)]
pub struct GatewayStats {
    pub exchanges: usize,
    pub code_context: BTreeMap<String, CodeContextEntry>,
    pub naming_counts: BTreeMap<ConstructKind, BTreeMap<NamingStyle, u32>>,
    pub preferred_libraries: Vec<String>,
    pub feedback_count: usize,
    pub acceptance_rate: f64,
    pub current_task: Option<String>,
}

/// One completed question/answer pair, kept for prompt assembly.
#[derive(Debug, Clone)]
struct Exchange {
    prompt: String,
    response: String,
    timestamp: DateTime<Utc>,
    current_task: Option<String>,
}

struct GatewayState {
    router: ConversationRouter,
    code_context: BTreeMap<String, CodeContextEntry>,
    learning: LearningStore,
    exchanges: Vec<Exchange>,
    suggestion_seq: u64,
}

impl GatewayState {
    fn new() -> Self {
        Self {
            router: ConversationRouter::new(),
            code_context: BTreeMap::new(),
            learning: LearningStore::new(),
            exchanges: Vec::new(),
            suggestion_seq: 0,
        }
    }

    fn ingest(&mut self, submission: CodeSubmission) {
        let entry = parse_code_context(&submission.filename, &submission.code);
        if let Some(err) = &entry.error {
            warn!(
                "code context for {} recorded with error: {err}",
                submission.filename
            );
        }
        self.learning.observe(&entry);
        self.code_context.insert(submission.filename, entry);
    }

    fn next_suggestion_id(&mut self) -> String {
        self.suggestion_seq += 1;
        format!("s-{}", self.suggestion_seq)
    }

    /// Bounded prompt: system preamble, the last few exchanges, every
    /// code-context entry, the learned-style summary, the acceptance rate,
    /// and the current task, then the question itself.
    fn build_prompt(
        &self,
        config: &GatewayConfig,
        question: &str,
        context: &ConversationContext,
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str(&config.system_preamble);
        prompt.push_str("\n\n");

        if !self.exchanges.is_empty() {
            prompt.push_str("Previous conversation:\n");
            let skip = self.exchanges.len().saturating_sub(config.history_window);
            for exchange in &self.exchanges[skip..] {
                prompt.push_str(&format!(
                    "User: {}\nAssistant: {}\n\n",
                    exchange.prompt, exchange.response
                ));
            }
        }

        if !self.code_context.is_empty() {
            prompt.push_str("Code context:\n");
            for (filename, entry) in &self.code_context {
                prompt.push_str(&format!("\nFile: {filename}\n"));
                if let Ok(serialized) = serde_json::to_string_pretty(entry) {
                    prompt.push_str(&serialized);
                    prompt.push('\n');
                }
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!("Learned preferences: {}\n", self.learning.summary()));
        prompt.push_str(&format!(
            "Suggestion acceptance rate: {:.1}%\n",
            self.learning.acceptance_rate()
        ));
        if let Some(task) = &context.current_task {
            prompt.push_str(&format!("Current task: {task}\n"));
        }

        prompt.push_str(&format!("\nCurrent question: {question}\n"));
        prompt
    }
}

enum PendingAsk {
    Immediate(RouterResponse),
    Inference(String),
}

/// Serializes access to the inference engine and keeps the conversational,
/// code-context, and learned state behind one lock. The engine lock is held
/// only across the model call itself, so conversational requests keep
/// flowing while an inference runs.
pub struct AiGateway {
    config: GatewayConfig,
    engine: Arc<dyn InferenceEngine>,
    state: Mutex<GatewayState>,
    inference_lock: Mutex<()>,
}

impl AiGateway {
    pub fn new(config: GatewayConfig, engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            config,
            engine,
            state: Mutex::new(GatewayState::new()),
            inference_lock: Mutex::new(()),
        }
    }

    /// Session-opening message.
    pub async fn welcome(&self) -> String {
        let state = self.state.lock().await;
        state.router.welcome().message().unwrap_or("").to_string()
    }

    pub async fn set_user_name(&self, name: &str) -> String {
        let mut state = self.state.lock().await;
        state
            .router
            .set_user_name(name)
            .message()
            .unwrap_or("")
            .to_string()
    }

    /// Answer one prompt, optionally ingesting submitted code as context
    /// first. Conversational inputs are answered from templates; technical
    /// inputs go to the model under the inference lock.
    pub async fn ask(
        &self,
        prompt: &str,
        submission: Option<CodeSubmission>,
    ) -> Result<AskReply> {
        let pending = {
            let mut state = self.state.lock().await;
            if let Some(submission) = submission {
                state.ingest(submission);
            }
            match state.router.process(prompt) {
                RouterResponse::Technical { category, context } => {
                    debug!("technical request ({category}); routing to the model");
                    PendingAsk::Inference(state.build_prompt(&self.config, prompt, &context))
                }
                response => PendingAsk::Immediate(response),
            }
        };

        match pending {
            PendingAsk::Immediate(response) => Ok(AskReply {
                text: response.message().unwrap_or("").to_string(),
                suggestion_id: None,
            }),
            PendingAsk::Inference(full_prompt) => {
                let outcome = {
                    // Single flight: the engine is not safe for concurrent
                    // calls, so every caller queues here in arrival order.
                    let _guard = self.inference_lock.lock().await;
                    self.engine
                        .infer(&full_prompt, self.config.max_tokens, self.config.temperature)
                        .await
                };
                let text = outcome?;
                let trimmed = text.trim().to_string();

                let mut state = self.state.lock().await;
                let exchange = Exchange {
                    prompt: prompt.to_string(),
                    response: trimmed.clone(),
                    timestamp: Utc::now(),
                    current_task: state.router.current_task().map(str::to_string),
                };
                debug!(
                    "recorded exchange at {} (task: {:?})",
                    exchange.timestamp, exchange.current_task
                );
                state.exchanges.push(exchange);
                let suggestion_id = state.next_suggestion_id();
                Ok(AskReply {
                    text: trimmed,
                    suggestion_id: Some(suggestion_id),
                })
            }
        }
    }

    /// Record feedback on a prior suggestion. Malformed identifiers are
    /// rejected before anything is written.
    pub async fn provide_feedback(
        &self,
        suggestion_id: &str,
        was_helpful: bool,
        comments: Option<String>,
    ) -> Result<()> {
        let id = suggestion_id.trim();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(GatewayError::MalformedFeedback(suggestion_id.to_string()));
        }
        let mut state = self.state.lock().await;
        state.learning.record_feedback(FeedbackRecord {
            timestamp: Utc::now(),
            suggestion_id: id.to_string(),
            was_helpful,
            comments,
        });
        Ok(())
    }

    /// Reset the conversational slate: exchanges, router history, and
    /// code-context entries. Learned state persists for the life of the
    /// gateway.
    pub async fn clear_history(&self) {
        let mut state = self.state.lock().await;
        state.exchanges.clear();
        state.code_context.clear();
        state.router.clear();
        info!("conversation history and code context cleared");
    }

    pub async fn acceptance_rate(&self) -> f64 {
        self.state.lock().await.learning.acceptance_rate()
    }

    /// Identifier of the most recent model-backed suggestion, if any. The
    /// bare `feedback` command applies to this suggestion.
    pub async fn last_suggestion_id(&self) -> Option<String> {
        let state = self.state.lock().await;
        if state.suggestion_seq == 0 {
            None
        } else {
            Some(format!("s-{}", state.suggestion_seq))
        }
    }

    pub async fn stats(&self) -> GatewayStats {
        let state = self.state.lock().await;
        GatewayStats {
            exchanges: state.exchanges.len(),
            code_context: state.code_context.clone(),
            naming_counts: state.learning.naming_counts().clone(),
            preferred_libraries: state
                .learning
                .preferred_libraries()
                .iter()
                .cloned()
                .collect(),
            feedback_count: state.learning.feedback_count(),
            acceptance_rate: state.learning.acceptance_rate(),
            current_task: state.router.current_task().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct MockEngine {
        calls: AtomicUsize,
        in_flight: AtomicBool,
        saw_overlap: AtomicBool,
        delay: Duration,
        fail: bool,
    }

    impl MockEngine {
        fn new() -> Self {
            Self::with_delay(Duration::from_millis(0))
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicBool::new(false),
                saw_overlap: AtomicBool::new(false),
                delay,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceEngine for MockEngine {
        async fn infer(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> std::result::Result<String, EngineError> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.saw_overlap.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(self.delay).await;
            self.in_flight.store(false, Ordering::SeqCst);
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                Err(EngineError::MalformedResponse("engine down".to_string()))
            } else {
                Ok(format!("  suggestion {call}  "))
            }
        }
    }

    fn gateway_with(engine: Arc<MockEngine>) -> AiGateway {
        AiGateway::new(GatewayConfig::default(), engine)
    }

    #[tokio::test]
    async fn greetings_never_reach_the_engine() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine.clone());

        for _ in 0..3 {
            let reply = gateway.ask("hello", None).await.expect("ask");
            assert!(reply.text.contains("there"));
            assert_eq!(reply.suggestion_id, None);
        }
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn greeting_uses_the_stored_name() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine.clone());

        let reply = gateway.ask("hello", None).await.expect("ask");
        assert!(reply.text.contains("there"));

        gateway.set_user_name("Sam").await;
        let reply = gateway.ask("hello", None).await.expect("ask");
        assert!(reply.text.contains("Sam"));
    }

    #[tokio::test]
    async fn technical_requests_invoke_the_model_once() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine.clone());

        let reply = gateway
            .ask("please fix the parser bug", None)
            .await
            .expect("ask");
        assert_eq!(engine.calls(), 1);
        assert_eq!(reply.text, "suggestion 1");
        assert_eq!(reply.suggestion_id.as_deref(), Some("s-1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_technical_asks_never_overlap() {
        let engine = Arc::new(MockEngine::with_delay(Duration::from_millis(25)));
        let gateway = Arc::new(gateway_with(engine.clone()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let gateway = gateway.clone();
            handles.push(tokio::spawn(async move {
                gateway.ask(&format!("fix bug number {i}"), None).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("ask");
        }

        assert_eq!(engine.calls(), 4);
        assert!(!engine.saw_overlap.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn ingestion_updates_context_and_learning() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine.clone());

        let submission = CodeSubmission {
            filename: "example.py".to_string(),
            code: "import math\n\ndef calculate_sum(a, b):\n    return a + b\n".to_string(),
        };
        gateway.ask("hello", Some(submission)).await.expect("ask");

        let stats = gateway.stats().await;
        let entry = stats
            .code_context
            .get("example.py")
            .expect("entry recorded");
        assert_eq!(entry.functions[0].name, "calculate_sum");
        assert_eq!(entry.imports, vec!["math"]);
        assert_eq!(
            stats.naming_counts[&ConstructKind::Function][&NamingStyle::SnakeCase],
            1
        );
        assert_eq!(stats.preferred_libraries, vec!["math"]);
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn reingesting_a_file_replaces_its_entry() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine);

        let first = CodeSubmission {
            filename: "example.py".to_string(),
            code: "def calculate_sum(a, b):\n    return a + b\n".to_string(),
        };
        let second = CodeSubmission {
            filename: "example.py".to_string(),
            code: "def calculate_product(a, b):\n    return a * b\n".to_string(),
        };
        gateway.ask("hi", Some(first)).await.expect("ask");
        gateway.ask("hi", Some(second)).await.expect("ask");

        let stats = gateway.stats().await;
        let entry = &stats.code_context["example.py"];
        assert_eq!(entry.functions.len(), 1);
        assert_eq!(entry.functions[0].name, "calculate_product");
        assert_eq!(stats.code_context.len(), 1);
    }

    #[tokio::test]
    async fn clear_history_preserves_learned_state() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine);

        let submission = CodeSubmission {
            filename: "example.py".to_string(),
            code: "import math\n\ndef calculate_sum(a, b):\n    return a + b\n".to_string(),
        };
        gateway
            .ask("debug the error", Some(submission))
            .await
            .expect("ask");
        gateway
            .provide_feedback("s-1", true, None)
            .await
            .expect("feedback");

        gateway.clear_history().await;

        let stats = gateway.stats().await;
        assert_eq!(stats.exchanges, 0);
        assert!(stats.code_context.is_empty());
        // Learned state survives the reset.
        assert_eq!(stats.preferred_libraries, vec!["math"]);
        assert_eq!(
            stats.naming_counts[&ConstructKind::Function][&NamingStyle::SnakeCase],
            1
        );
        assert_eq!(stats.feedback_count, 1);
    }

    #[tokio::test]
    async fn acceptance_rate_tracks_feedback() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine);

        assert_eq!(gateway.acceptance_rate().await, 100.0);
        for id in ["s-1", "s-2", "s-3"] {
            gateway
                .provide_feedback(id, true, None)
                .await
                .expect("feedback");
        }
        gateway
            .provide_feedback("s-4", false, Some("not idiomatic".to_string()))
            .await
            .expect("feedback");
        assert_eq!(gateway.acceptance_rate().await, 75.0);
    }

    #[tokio::test]
    async fn blank_feedback_identifier_is_rejected() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine);

        let err = gateway
            .provide_feedback("   ", true, None)
            .await
            .expect_err("must reject");
        assert!(matches!(err, GatewayError::MalformedFeedback(_)));
        assert_eq!(gateway.stats().await.feedback_count, 0);
    }

    #[tokio::test]
    async fn inference_failure_is_typed_and_recoverable() {
        let engine = Arc::new(MockEngine::failing());
        let gateway = gateway_with(engine.clone());

        let err = gateway
            .ask("fix the bug", None)
            .await
            .expect_err("engine fails");
        assert!(matches!(err, GatewayError::Inference(_)));

        // The gateway stays usable for conversational traffic and records
        // no exchange for the failed call.
        let reply = gateway.ask("hello", None).await.expect("ask");
        assert!(reply.suggestion_id.is_none());
        assert_eq!(gateway.stats().await.exchanges, 0);
    }

    #[tokio::test]
    async fn prompt_is_bounded_to_recent_exchanges() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine);

        for i in 0..4 {
            gateway
                .ask(&format!("fix bug number {i}"), None)
                .await
                .expect("ask");
        }

        let state = gateway.state.lock().await;
        let context = state.router.context().clone();
        let prompt = state.build_prompt(&GatewayConfig::default(), "next question", &context);
        // Window of 3: the oldest exchange has fallen out.
        assert!(!prompt.contains("fix bug number 0"));
        assert!(prompt.contains("fix bug number 1"));
        assert!(prompt.contains("fix bug number 3"));
        assert!(prompt.contains("Suggestion acceptance rate: 100.0%"));
        assert!(prompt.contains("Current question: next question"));
    }

    #[tokio::test]
    async fn task_switch_is_reflected_in_prompt_and_stats() {
        let engine = Arc::new(MockEngine::new());
        let gateway = gateway_with(engine.clone());

        let reply = gateway.ask("frontend", None).await.expect("ask");
        assert!(reply.text.contains("framework"));
        assert_eq!(engine.calls(), 0);
        assert_eq!(gateway.stats().await.current_task.as_deref(), Some("frontend"));

        gateway.ask("fix the bug", None).await.expect("ask");
        let state = gateway.state.lock().await;
        let context = state.router.context().clone();
        let prompt = state.build_prompt(&GatewayConfig::default(), "q", &context);
        assert!(prompt.contains("Current task: frontend"));
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("inference request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model server returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Synchronous, single-call contract with the underlying model. The gateway
/// depends only on this; the engine itself is a shared resource that must
/// never see concurrent calls.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    async fn infer(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, EngineError>;
}

/// Configuration for the local model server client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the model server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model to run.
    #[serde(default = "default_model")]
    pub model: String,

    /// Offload layers to the GPU. Disabled forces CPU-only inference.
    #[serde(default = "default_true")]
    pub use_gpu: bool,

    /// Client-side cap on one inference call. A hung server must not wedge
    /// the inference lock forever.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "codellama:7b-instruct".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            use_gpu: default_true(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Client for a local Ollama-compatible model server.
pub struct OllamaEngine {
    config: EngineConfig,
    client: reqwest::Client,
}

impl OllamaEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl InferenceEngine for OllamaEngine {
    async fn infer(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, EngineError> {
        let mut options = json!({
            "num_predict": max_tokens,
            "temperature": temperature,
        });
        if !self.config.use_gpu {
            options["num_gpu"] = json!(0);
        }
        let request = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        });

        debug!(
            "requesting inference from {} (model {})",
            self.config.base_url, self.config.model
        );
        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EngineError::Status(response.status()));
        }
        let body: serde_json::Value = response.json().await?;
        body.get("response")
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::MalformedResponse("missing response field".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::body_partial_json;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    fn engine_for(server: &MockServer) -> OllamaEngine {
        OllamaEngine::new(EngineConfig {
            base_url: server.uri(),
            model: "test-model".to_string(),
            use_gpu: false,
            request_timeout_secs: 5,
        })
        .expect("client builds")
    }

    #[tokio::test]
    async fn infer_extracts_the_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "stream": false,
                "options": {"num_predict": 512, "num_gpu": 0},
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "  use a loop  "})),
            )
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let text = engine.infer("how?", 512, 0.7).await.expect("inference");
        assert_eq!(text, "  use a loop  ");
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let err = engine.infer("how?", 512, 0.7).await.expect_err("must fail");
        assert!(matches!(err, EngineError::Status(status) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn missing_response_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": true})),
            )
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let err = engine.infer("how?", 512, 0.7).await.expect_err("must fail");
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }
}

//! Completion provider abstraction: a pluggable trait, HTTP-backed OpenAI and
//! Anthropic implementations, a deterministic canned provider for local/dev
//! use, and the retrying client that wraps whichever provider is configured.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{is_transient_status, CuriousMindError, Result};

/// Error surfaced by a completion provider, carrying the HTTP-like status used
/// for retry classification.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429) || self.code.as_deref() == Some("rate_limit_exceeded")
    }

    pub fn is_transient(&self) -> bool {
        self.is_rate_limited() || matches!(self.status, Some(code) if is_transient_status(code))
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "provider error {}: {}", status, self.message),
            None => write!(f, "provider error: {}", self.message),
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One logical "generate text from two prompts" call. The returned text is
    /// expected to be a JSON-encoded object; its shape is the caller's concern.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, ProviderError>;

    fn name(&self) -> &'static str;
}

// OpenAI chat completions implementation
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: config.system.completion_model.clone(),
            max_tokens: config.system.max_tokens,
            temperature: config.system.temperature,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, ProviderError> {
        debug!(
            "OpenAI completion (model={}, prompt_chars={})",
            self.model,
            user_prompt.len()
        );

        let body = OpenAiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError {
                status: Some(status),
                code: None,
                message: format!("OpenAI API error: {}", error_text),
            });
        }

        let parsed: OpenAiResponse = response.json().await.map_err(transport_error)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError {
                status: None,
                code: None,
                message: "No completion returned from OpenAI".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// Anthropic messages implementation
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

impl AnthropicProvider {
    pub fn new(api_key: String, config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: config.system.completion_model.clone(),
            max_tokens: config.system.max_tokens,
            temperature: config.system.temperature,
        })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, ProviderError> {
        debug!(
            "Anthropic completion (model={}, prompt_chars={})",
            self.model,
            user_prompt.len()
        );

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system_prompt,
            messages: vec![ChatMessage {
                role: "user",
                content: user_prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError {
                status: Some(status),
                code: None,
                message: format!("Anthropic API error: {}", error_text),
            });
        }

        let parsed: AnthropicResponse = response.json().await.map_err(transport_error)?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| ProviderError {
                status: None,
                code: None,
                message: "No completion returned from Anthropic".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    ProviderError {
        status: err.status().map(|s| s.as_u16()),
        code: None,
        message: err.to_string(),
    }
}

/// Deterministic, local provider for testing/dev (no network). Recognizes the
/// three prompt families the pipelines send and answers each with a canned
/// payload of the matching shape.
pub struct CannedProvider;

#[async_trait]
impl CompletionProvider for CannedProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, ProviderError> {
        if system_prompt.contains("fact-checker") {
            return Ok(serde_json::json!({
                "is_valid": true,
                "confidence_score": 90,
                "issues": []
            })
            .to_string());
        }

        if user_prompt.contains("Question to answer:") {
            return Ok(serde_json::json!({
                "answer": "Cats purr through a complex mechanism involving their laryngeal muscles and neural oscillators. When cats are content, their brain sends signals to muscles in their larynx, causing them to contract and relax rapidly at 20-50 Hz. The fascinating part is that purring isn't just for communication - the vibrations actually promote bone healing and reduce pain.",
                "sources": [
                    "Journal of Feline Medicine",
                    "Veterinary Physiology Research",
                    "Animal Behavior Studies"
                ],
                "confidence_score": 92
            })
            .to_string());
        }

        Ok(serde_json::json!({
            "question": "Why do cats purr when they're content?",
            "complexity_score": 6,
            "category": "biological",
            "hook_line": "The secret vibration that reveals a cat's emotional state"
        })
        .to_string())
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

// Factory function to create a provider based on configuration
pub fn create_provider(config: &Config) -> anyhow::Result<Arc<dyn CompletionProvider>> {
    match config.system.completion_provider.as_str() {
        "openai" => {
            let key = config.runtime.openai_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("completion_provider=openai but OPENAI_API_KEY is not set")
            })?;
            info!(
                "Using OpenAI completions (model={})",
                config.system.completion_model
            );
            Ok(Arc::new(OpenAiProvider::new(key, config)?))
        }
        "anthropic" => {
            let key = config.runtime.anthropic_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("completion_provider=anthropic but ANTHROPIC_API_KEY is not set")
            })?;
            info!(
                "Using Anthropic completions (model={})",
                config.system.completion_model
            );
            Ok(Arc::new(AnthropicProvider::new(key, config)?))
        }
        _ => {
            info!("Using CannedProvider (deterministic, no network)");
            Ok(Arc::new(CannedProvider))
        }
    }
}

/// Retry/backoff policy for one logical completion call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_jitter_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.system.retry_attempts,
            base_delay: Duration::from_millis(config.system.retry_base_delay_ms),
            max_jitter_ms: 1000,
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.max_jitter_ms)
        };
        self.base_delay * 2u32.saturating_pow(attempt) + Duration::from_millis(jitter)
    }
}

/// Client wrapping a provider with retry, exponential backoff with jitter,
/// and error classification.
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    policy: RetryPolicy,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &Config) -> Self {
        Self {
            provider,
            policy: RetryPolicy::from_config(config),
        }
    }

    pub fn with_policy(provider: Arc<dyn CompletionProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Issue one logical completion, retrying rate-limited and transient
    /// failures with exponential backoff. The last error is surfaced when the
    /// attempt ceiling is exhausted, never swallowed.
    pub async fn generate_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let mut last_err: Option<ProviderError> = None;

        for attempt in 0..self.policy.attempts {
            match self.provider.complete(system_prompt, user_prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_rate_limited() => {
                    let delay = self.policy.backoff_delay(attempt);
                    info!(
                        "Rate limit hit, retrying in {}ms (attempt {}/{})",
                        delay.as_millis(),
                        attempt + 1,
                        self.policy.attempts
                    );
                    last_err = Some(err);
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_transient() => {
                    warn!(
                        "Transient provider failure (attempt {}/{}): {}",
                        attempt + 1,
                        self.policy.attempts,
                        err
                    );
                    last_err = Some(err);
                    if attempt + 1 < self.policy.attempts {
                        tokio::time::sleep(self.policy.backoff_delay(attempt)).await;
                    }
                }
                Err(err) => {
                    return Err(CuriousMindError::ProviderFatal {
                        status: err.status,
                        message: err.message,
                    });
                }
            }
        }

        let err = last_err.unwrap_or(ProviderError {
            status: None,
            code: None,
            message: "Max retry attempts exceeded".to_string(),
        });
        match err.status {
            Some(status) if err.is_transient() => Err(CuriousMindError::ProviderTransient {
                status,
                message: err.message,
            }),
            _ => Err(CuriousMindError::ProviderFatal {
                status: err.status,
                message: err.message,
            }),
        }
    }

    /// Best-effort shape check over a question-shaped response. A sanity
    /// filter, not a guarantee of semantic correctness.
    pub fn validate_response(&self, response: &str) -> bool {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(response) else {
            return false;
        };

        let question_ok = value
            .get("question")
            .and_then(|q| q.as_str())
            .map(|q| q.to_lowercase().starts_with("why"))
            .unwrap_or(false);
        let complexity_ok = value
            .get("complexity_score")
            .and_then(|c| c.as_i64())
            .map(|c| (1..=10).contains(&c))
            .unwrap_or(false);
        let category_ok = value.get("category").map(|c| c.is_string()).unwrap_or(false);
        let hook_ok = value.get("hook_line").map(|h| h.is_string()).unwrap_or(false);

        question_ok && complexity_ok && category_ok && hook_ok
    }
}

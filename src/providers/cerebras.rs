//! Cerebras provider implementation for Palaver
//!
//! Talks to the Cerebras OpenAI-compatible chat completions endpoint.
//! Requests are never retried; every failure is mapped to an upstream error
//! with a message describing its class.

use crate::config::CerebrasConfig;
use crate::error::{PalaverError, Result};
use crate::providers::{
    CompletionRequest, CompletionResponse, Message, ModelCapability, ModelInfo, Provider,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER_NAME: &str = "cerebras";

/// Cerebras provider
///
/// # Examples
///
/// ```
/// use palaver::config::CerebrasConfig;
/// use palaver::providers::{CerebrasProvider, Provider};
///
/// let provider = CerebrasProvider::new(CerebrasConfig::default()).unwrap();
/// assert_eq!(provider.default_model(), "llama-4-scout-17b-16e-instruct");
/// ```
#[derive(Debug)]
pub struct CerebrasProvider {
    client: Client,
    config: CerebrasConfig,
    api_key: Option<String>,
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct CerebrasRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
}

/// Response body from the chat completions endpoint
#[derive(Debug, Deserialize)]
struct CerebrasResponse {
    choices: Option<Vec<CerebrasChoice>>,
    usage: Option<CerebrasUsage>,
}

#[derive(Debug, Deserialize)]
struct CerebrasChoice {
    message: CerebrasMessage,
    #[allow(dead_code)]
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CerebrasMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CerebrasUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

impl From<CerebrasUsage> for TokenUsage {
    fn from(usage: CerebrasUsage) -> Self {
        let mut converted = TokenUsage::new(usage.prompt_tokens, usage.completion_tokens);
        if usage.total_tokens > 0 {
            converted.total_tokens = usage.total_tokens;
        }
        converted
    }
}

/// Map a non-success status to an upstream error
fn format_cerebras_api_error(status: StatusCode, body: &str) -> PalaverError {
    let class = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            "Authentication failed. Check CEREBRAS_API_KEY"
        }
        StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded",
        s if s.is_server_error() => "Cerebras server error",
        _ => "Cerebras request rejected",
    };
    PalaverError::Upstream(format!("{} ({}): {}", class, status, body))
}

/// Map a transport failure to an upstream error
fn format_transport_error(err: &reqwest::Error) -> PalaverError {
    if err.is_timeout() {
        PalaverError::Upstream(format!("Cerebras request timed out: {}", err))
    } else if err.is_connect() {
        PalaverError::Upstream(format!("Failed to connect to Cerebras: {}", err))
    } else {
        PalaverError::Upstream(format!("Cerebras request failed: {}", err))
    }
}

impl CerebrasProvider {
    /// Create a new Cerebras provider instance
    ///
    /// The API key is resolved once, here; a missing key is only reported
    /// by [`Provider::check_credentials`] or on the first call.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: CerebrasConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("palaver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PalaverError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = config.resolve_api_key();

        tracing::info!(
            "Initialized Cerebras provider: model={}, credentials={}",
            config.model,
            if api_key.is_some() { "present" } else { "missing" }
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            PalaverError::MissingCredentials(format!(
                "{} (set {} or add it to .env.local)",
                PROVIDER_NAME, self.config.api_key_env
            ))
            .into()
        })
    }
}

#[async_trait]
impl Provider for CerebrasProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let api_key = self.api_key()?;

        let body = CerebrasRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            "Sending Cerebras request: model={}, {} messages, max_tokens={}",
            request.model,
            request.messages.len(),
            request.max_tokens
        );

        let response = self
            .client
            .post(self.api_endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Cerebras request failed: {}", e);
                format_transport_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Cerebras returned error {}: {}", status, error_text);
            return Err(format_cerebras_api_error(status, &error_text).into());
        }

        let text = response.text().await.map_err(|e| {
            tracing::error!("Failed to read Cerebras response: {}", e);
            format_transport_error(&e)
        })?;

        let parsed: CerebrasResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse Cerebras response: {}", e);
            PalaverError::Upstream(format!("Invalid JSON in Cerebras response: {}", e))
        })?;

        let content = parsed
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                tracing::error!("Cerebras response has no choices: {}", text);
                PalaverError::Upstream(
                    "Invalid response format: missing choices[0].message.content".to_string(),
                )
            })?;

        tracing::debug!("Cerebras response received successfully");

        Ok(match parsed.usage {
            Some(usage) => CompletionResponse::with_usage(content, usage.into()),
            None => CompletionResponse::new(content),
        })
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        let chat = vec![ModelCapability::TextGeneration, ModelCapability::Chat];
        vec![
            ModelInfo::new("llama-4-scout-17b-16e-instruct", "Llama 4 Scout", 8192)
                .with_capabilities(chat.clone())
                .with_knowledge_cutoff("August 2024"),
            ModelInfo::new("llama3.1-8b", "Llama 3.1 8B", 8192)
                .with_capabilities(chat.clone())
                .with_knowledge_cutoff("March 2023"),
            ModelInfo::new("llama-3.3-70b", "Llama 3.3 70B", 8192)
                .with_capabilities(chat.clone())
                .with_knowledge_cutoff("December 2023"),
            ModelInfo::new(
                "deepseek-r1-distill-llama-70b",
                "DeepSeek R1 Distill Llama 70B",
                8192,
            )
            .with_capabilities(chat)
            .with_knowledge_cutoff("December 2023")
            .private_preview(),
        ]
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    fn check_credentials(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }
}

//! Offline mock provider
//!
//! Returns canned replies without touching the network so the CLI and the
//! conversation client can be exercised without credentials.

use crate::error::Result;
use crate::providers::{
    estimate_tokens, CompletionRequest, CompletionResponse, ModelCapability, ModelInfo, Provider,
    TokenUsage,
};
use crate::session::SUMMARY_PROMPT;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

const PROVIDER_NAME: &str = "mock";

/// Replies returned in rotation
pub const MOCK_RESPONSES: [&str; 5] = [
    "I'm a mock AI assistant helping you test your code.",
    "This is a test response from the mock AI system.",
    "Your test is working correctly if you see this message.",
    "Mock AI systems are useful for testing without API costs.",
    "This is a simulated response that doesn't use a real AI API.",
];

/// Mock provider with rotating canned replies
///
/// # Examples
///
/// ```
/// use palaver::providers::{MockProvider, Provider};
///
/// let provider = MockProvider::new("mock-gpt-4")
///     .with_custom_response("ping", "pong");
/// assert_eq!(provider.default_model(), "mock-gpt-4");
/// ```
#[derive(Debug)]
pub struct MockProvider {
    model: String,
    next_response: AtomicUsize,
    custom_responses: HashMap<String, String>,
}

impl MockProvider {
    /// Create a mock provider whose sessions default to `model`
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        tracing::info!("Initialized mock provider: model={}", model);
        Self {
            model,
            next_response: AtomicUsize::new(0),
            custom_responses: HashMap::new(),
        }
    }

    /// Reply with `response` whenever the latest user message equals `message`
    pub fn with_custom_response(
        mut self,
        message: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses.insert(message.into(), response.into());
        self
    }

    fn next_canned(&self) -> &'static str {
        let index = self.next_response.fetch_add(1, Ordering::Relaxed) % MOCK_RESPONSES.len();
        MOCK_RESPONSES[index]
    }

    fn summarize(transcript: &str) -> String {
        let mut user_messages = Vec::new();
        let mut ai_count = 0;
        for block in transcript.split("\n\n") {
            if let Some(content) = block.strip_prefix("User: ") {
                user_messages.push(content.trim());
            } else if block.starts_with("AI: ") {
                ai_count += 1;
            }
        }

        format!(
            "This conversation contains {} user messages and {} AI responses. The user asked about: {}...",
            user_messages.len(),
            ai_count,
            user_messages
                .iter()
                .take(2)
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("mock-gpt-4")
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let is_summary = request
            .messages
            .first()
            .map(|m| m.role == "system" && m.content == SUMMARY_PROMPT)
            .unwrap_or(false);

        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let content = if is_summary {
            Self::summarize(last_user)
        } else if let Some(custom) = self.custom_responses.get(last_user) {
            custom.clone()
        } else {
            self.next_canned().to_string()
        };

        tracing::debug!(
            "Mock provider replying to {} messages (summary={})",
            request.messages.len(),
            is_summary
        );

        let usage = TokenUsage::new(request.estimated_tokens(), estimate_tokens(&content));
        Ok(CompletionResponse::with_usage(content, usage))
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("mock-gpt-4", "Mock GPT-4", 8192),
            ModelInfo::new("mock-gpt-3", "Mock GPT-3.5", 4096),
            ModelInfo::new("mock-small", "Mock Small Model", 2048)
                .with_capabilities(vec![ModelCapability::TextGeneration]),
        ]
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

//! Base provider trait and common types for Palaver
//!
//! This module defines the Provider trait that every upstream chat-completion
//! backend implements, along with the wire-neutral request, response and
//! model metadata types the conversation client works with.

use crate::error::{PalaverError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for an upstream request
///
/// Roles follow the OpenAI-compatible convention: `system`, `user`,
/// `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, user!");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::providers::Message;
    ///
    /// let msg = Message::system("You are a helpful assistant");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// A single chat-completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Ordered conversation sent upstream
    pub messages: Vec<Message>,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a new request
    pub fn new(model: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
        }
    }

    /// Heuristic token count of everything in the request
    pub fn estimated_tokens(&self) -> usize {
        self.messages
            .iter()
            .map(|m| estimate_tokens(&m.content))
            .sum()
    }
}

/// Token usage information from a completion
///
/// Tracks the number of tokens used in prompts and completions,
/// as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Generated assistant text
    pub content: String,
    /// Token usage reported by the provider, if any
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse without usage information
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::providers::CompletionResponse;
    ///
    /// let response = CompletionResponse::new("Hello!");
    /// assert_eq!(response.content, "Hello!");
    /// assert!(response.usage.is_none());
    /// ```
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    pub fn with_usage(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage: Some(usage),
        }
    }
}

/// Model capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelCapability {
    /// Free-form text generation
    TextGeneration,
    /// Multi-turn chat
    Chat,
}

impl std::fmt::Display for ModelCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextGeneration => write!(f, "text-generation"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// Metadata about a model offered by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier sent upstream (e.g. "llama3.1-8b")
    pub id: String,
    /// Display name
    pub name: String,
    /// Supported capabilities
    pub capabilities: Vec<ModelCapability>,
    /// Maximum tokens the model accepts
    pub max_tokens: usize,
    /// Training data cutoff, when published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_cutoff: Option<String>,
    /// Model is only available as a private preview
    #[serde(default)]
    pub private_preview: bool,
}

impl ModelInfo {
    /// Create a new chat model entry
    ///
    /// Models default to the `text-generation` and `chat` capabilities.
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::providers::ModelInfo;
    ///
    /// let model = ModelInfo::new("llama3.1-8b", "Llama 3.1 8B", 8192);
    /// assert_eq!(model.id, "llama3.1-8b");
    /// assert_eq!(model.capabilities.len(), 2);
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capabilities: vec![ModelCapability::TextGeneration, ModelCapability::Chat],
            max_tokens,
            knowledge_cutoff: None,
            private_preview: false,
        }
    }

    /// Replace the capability list
    pub fn with_capabilities(mut self, capabilities: Vec<ModelCapability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the knowledge cutoff
    pub fn with_knowledge_cutoff(mut self, cutoff: impl Into<String>) -> Self {
        self.knowledge_cutoff = Some(cutoff.into());
        self
    }

    /// Mark the model as private preview
    pub fn private_preview(mut self) -> Self {
        self.private_preview = true;
        self
    }

    /// Check whether the model supports a capability
    pub fn supports(&self, capability: ModelCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Upstream chat-completion provider
///
/// Implementations issue at most one outbound call per `complete` and never
/// retry.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short provider name used in logs and metrics labels
    fn name(&self) -> &str;

    /// Completes a conversation
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the call fails or the response is invalid
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Static table of models this provider offers
    fn list_models(&self) -> Vec<ModelInfo>;

    /// Model used when a session does not name one
    fn default_model(&self) -> &str;

    /// Verify that credentials needed for `complete` are present
    ///
    /// The default implementation accepts everything.
    fn check_credentials(&self) -> Result<()> {
        Ok(())
    }

    /// Look up a model in the provider's table
    ///
    /// # Errors
    ///
    /// Returns `ModelNotFound` listing the valid identifiers
    fn find_model(&self, model_id: &str) -> Result<ModelInfo> {
        let models = self.list_models();
        models
            .iter()
            .find(|m| m.id == model_id)
            .cloned()
            .ok_or_else(|| {
                PalaverError::ModelNotFound {
                    model: model_id.to_string(),
                    available: models
                        .iter()
                        .map(|m| m.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }
                .into()
            })
    }
}

/// Estimates token count for a string using a simple heuristic
///
/// Uses characters / 4 rounded up, which approximates common tokenizers for
/// English text.
///
/// # Examples
///
/// ```
/// use palaver::providers::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("abcde"), 2);
/// ```
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() + 3) / 4
}

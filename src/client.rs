//! Session-based conversation client
//!
//! [`ConversationClient`] translates method calls into provider requests and
//! folds the responses into the session table. Each operation issues at most
//! one upstream call and never retries; a failed call leaves the session
//! untouched.

use crate::config::{ClientConfig, Config};
use crate::error::{error_kind, ErrorKind, PalaverError, Result};
use crate::metrics::UpstreamCallMetrics;
use crate::providers::{
    create_provider, estimate_tokens, CompletionRequest, CompletionResponse, Message, ModelInfo,
    Provider,
};
use crate::session::{
    Attachment, ChatMessage, ExportFormat, Sender, SessionExport, SessionStore, SessionSummary,
    UsageMetrics, SUMMARY_PROMPT,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Returned when a summary is requested for a near-empty conversation
pub const NOT_ENOUGH_TO_SUMMARIZE: &str = "Not enough conversation to summarize.";

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageResponse {
    /// Assistant reply text
    pub response: String,
    /// Time the reply was recorded
    pub timestamp: DateTime<Utc>,
}

/// Conversation client over a single upstream provider
pub struct ConversationClient {
    provider: Box<dyn Provider>,
    sessions: SessionStore,
    settings: ClientConfig,
}

impl std::fmt::Debug for ConversationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationClient")
            .field("provider", &self.provider.name())
            .field("sessions", &self.sessions.len())
            .field("settings", &self.settings)
            .finish()
    }
}

fn require_non_blank(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PalaverError::InvalidInput(format!("{} cannot be empty", what)).into());
    }
    Ok(())
}

fn error_label(err: &anyhow::Error) -> &'static str {
    match error_kind(err) {
        Some(ErrorKind::Configuration) => "configuration",
        Some(ErrorKind::Upstream) => "upstream",
        Some(ErrorKind::InvalidInput) => "invalid_input",
        Some(ErrorKind::NotFound) => "not_found",
        Some(ErrorKind::Io) | None => "other",
    }
}

impl ConversationClient {
    /// Create a client over an existing provider
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::client::ConversationClient;
    /// use palaver::config::ClientConfig;
    /// use palaver::providers::MockProvider;
    ///
    /// let client = ConversationClient::new(Box::new(MockProvider::default()), ClientConfig::default());
    /// assert!(client.list_sessions().is_empty());
    /// ```
    pub fn new(provider: Box<dyn Provider>, settings: ClientConfig) -> Self {
        Self {
            provider,
            sessions: SessionStore::new(),
            settings,
        }
    }

    /// Create a client for the provider selected in `config`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown provider type
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = create_provider(&config.provider.provider_type, &config.provider)?;
        Ok(Self::new(provider, config.client.clone()))
    }

    /// The wrapped provider
    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Start a session and return its identifier
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `user_id` is blank
    /// - `MissingCredentials` if the provider has no API key
    /// - `ModelNotFound` if `model` is not offered by the provider
    pub fn start_new_session(&mut self, user_id: &str, model: Option<&str>) -> Result<String> {
        require_non_blank(user_id, "User ID")?;
        self.provider.check_credentials()?;

        let model = model.unwrap_or_else(|| self.provider.default_model());
        let model = self.provider.find_model(model)?.id;

        let session_id = self.sessions.create(user_id, &model);
        tracing::info!(
            "Started session {} for user {} with model {}",
            session_id,
            user_id,
            model
        );
        Ok(session_id)
    }

    /// Send a user message and record the reply
    ///
    /// On success the user message and the reply are appended to the log and
    /// the session's counters are incremented. On failure the session is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank session identifier or message
    /// - `SessionNotFound` for an unknown session
    /// - `Upstream` if the provider call fails
    pub async fn send_message(&mut self, session_id: &str, text: &str) -> Result<MessageResponse> {
        require_non_blank(session_id, "Session ID")?;
        require_non_blank(text, "Message")?;

        let session = self.sessions.get(session_id)?;
        let request = CompletionRequest::new(
            session.model.clone(),
            session.upstream_messages(text),
            self.settings.max_tokens,
        );
        let user_message = ChatMessage::new(Sender::User, text);

        let response = self.call_upstream(&request, "chat").await?;
        let tokens = charged_tokens(&request, &response);

        let assistant_message = ChatMessage::new(Sender::Assistant, response.content);
        let result = MessageResponse {
            response: assistant_message.content.clone(),
            timestamp: assistant_message.timestamp,
        };

        let cost_per_1k = self.settings.cost_per_1k_tokens;
        let session = self.sessions.get_mut(session_id)?;
        session.push_exchange(user_message, assistant_message);
        session.record_usage(tokens, cost_per_1k);

        tracing::debug!(
            "Session {}: {} messages, {} tokens charged",
            session_id,
            session.messages().len(),
            tokens
        );
        Ok(result)
    }

    /// Attach files and then send a message
    ///
    /// Every path is checked before anything is attached. Attachments stay on
    /// the session even if the send itself fails.
    ///
    /// # Errors
    ///
    /// `Attachment` if any path does not exist, plus every error of
    /// [`send_message`](Self::send_message)
    pub async fn send_message_with_attachments<P: AsRef<Path>>(
        &mut self,
        session_id: &str,
        text: &str,
        paths: &[P],
    ) -> Result<MessageResponse> {
        require_non_blank(session_id, "Session ID")?;
        require_non_blank(text, "Message")?;
        self.sessions.get(session_id)?;

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                return Err(PalaverError::Attachment(format!(
                    "Attachment file not found: {}",
                    path.display()
                ))
                .into());
            }
        }

        for path in paths {
            self.attach_file(session_id, path.as_ref(), None).await?;
        }

        self.send_message(session_id, text).await
    }

    /// End a session, removing it from the table
    ///
    /// Returns false if the session was not live.
    pub fn end_session(&mut self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            tracing::info!("Ended session {}", session_id);
        } else {
            tracing::debug!("end_session: session {} not found", session_id);
        }
        removed
    }

    /// The last `limit` messages of a session (all when `None`)
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for an unknown session
    pub fn get_chat_history(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>> {
        Ok(self.sessions.get(session_id)?.history(limit).to_vec())
    }

    /// Models offered by the provider
    pub fn list_available_models(&self) -> Vec<ModelInfo> {
        self.provider.list_models()
    }

    /// Change the model used for a session's subsequent sends
    ///
    /// # Errors
    ///
    /// `SessionNotFound` or `ModelNotFound`
    pub fn switch_model(&mut self, session_id: &str, model_id: &str) -> Result<()> {
        self.sessions.get(session_id)?;
        let model = self.provider.find_model(model_id)?;
        let session = self.sessions.get_mut(session_id)?;
        tracing::info!(
            "Session {}: switching model {} -> {}",
            session_id,
            session.model,
            model.id
        );
        session.model = model.id;
        Ok(())
    }

    /// Attach a text file as conversation context
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` for an unknown session
    /// - `Attachment` if the file is missing, too large or not UTF-8 text
    pub async fn attach_file(
        &mut self,
        session_id: &str,
        path: impl AsRef<Path>,
        description: Option<&str>,
    ) -> Result<()> {
        let path = path.as_ref();
        self.sessions.get(session_id)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|_| {
            PalaverError::Attachment(format!("Attachment file not found: {}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(PalaverError::Attachment(format!(
                "Attachment is not a regular file: {}",
                path.display()
            ))
            .into());
        }
        if metadata.len() > self.settings.max_attachment_bytes {
            return Err(PalaverError::Attachment(format!(
                "Attachment {} is {} bytes, exceeding the limit of {} bytes",
                path.display(),
                metadata.len(),
                self.settings.max_attachment_bytes
            ))
            .into());
        }

        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8(bytes).map_err(|_| {
            PalaverError::Attachment(format!(
                "Attachment {} is not valid UTF-8 text",
                path.display()
            ))
        })?;

        let session = self.sessions.get_mut(session_id)?;
        session.add_attachment(Attachment {
            path: PathBuf::from(path),
            description: description.map(str::to_string),
            content,
            attached_at: Utc::now(),
        });

        tracing::info!("Session {}: attached {}", session_id, path.display());
        Ok(())
    }

    /// Usage counters for a session
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for an unknown session
    pub fn get_usage_metrics(&self, session_id: &str) -> Result<UsageMetrics> {
        Ok(self.sessions.get(session_id)?.metrics())
    }

    /// Ask the provider for a summary of the conversation
    ///
    /// Fewer than two messages short-circuits without an upstream call. The
    /// summary is charged to the session but not added to its log.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` or `Upstream`
    pub async fn summarize_conversation(&mut self, session_id: &str) -> Result<String> {
        let session = self.sessions.get(session_id)?;
        if session.messages().len() < 2 {
            return Ok(NOT_ENOUGH_TO_SUMMARIZE.to_string());
        }

        let request = CompletionRequest::new(
            session.model.clone(),
            vec![
                Message::system(SUMMARY_PROMPT),
                Message::user(session.transcript()),
            ],
            self.settings.summary_max_tokens,
        );

        let response = self.call_upstream(&request, "summary").await?;
        let tokens = charged_tokens(&request, &response);

        let cost_per_1k = self.settings.cost_per_1k_tokens;
        self.sessions
            .get_mut(session_id)?
            .record_usage(tokens, cost_per_1k);

        Ok(response.content)
    }

    /// Snapshot a session for export or archiving
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for an unknown session
    pub fn export_session(&self, session_id: &str) -> Result<SessionExport> {
        Ok(SessionExport::from_session(self.sessions.get(session_id)?))
    }

    /// Render a session's history in the given format
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for an unknown session
    pub fn export_chat_history(&self, session_id: &str, format: ExportFormat) -> Result<String> {
        self.export_session(session_id)?.render(format)
    }

    /// Restore an exported session into the live table
    ///
    /// A model the provider does not offer is replaced by the provider's
    /// default.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or the session is already
    /// live
    pub fn import_session(&mut self, json: &str) -> Result<String> {
        let mut export = SessionExport::parse(json)?;
        if self.provider.find_model(&export.model).is_err() {
            tracing::warn!(
                "Model {} is not offered by {}; using {}",
                export.model,
                self.provider.name(),
                self.provider.default_model()
            );
            export.model = self.provider.default_model().to_string();
        }

        let session_id = export.session_id.clone();
        self.sessions.insert(export.into_session())?;
        tracing::info!("Imported session {}", session_id);
        Ok(session_id)
    }

    /// Summaries of every live session, oldest first
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.list().into_iter().map(|s| s.summary()).collect()
    }

    async fn call_upstream(
        &self,
        request: &CompletionRequest,
        operation: &'static str,
    ) -> Result<CompletionResponse> {
        let call = UpstreamCallMetrics::new(self.provider.name(), operation);
        match self.provider.complete(request).await {
            Ok(response) => {
                call.record_success(charged_tokens(request, &response));
                Ok(response)
            }
            Err(e) => {
                call.record_error(error_label(&e));
                tracing::warn!("{} call to {} failed: {}", operation, call.provider(), e);
                Err(e)
            }
        }
    }
}

/// Tokens to charge for a call: provider usage when reported, else a heuristic
fn charged_tokens(request: &CompletionRequest, response: &CompletionResponse) -> usize {
    response
        .usage
        .map(|u| u.total_tokens)
        .unwrap_or_else(|| request.estimated_tokens() + estimate_tokens(&response.content))
}

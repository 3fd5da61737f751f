//! Session records and the in-memory session table
//!
//! A session is a logical conversation: an ordered, append-only message log
//! plus cumulative usage counters. The [`SessionStore`] owns every live
//! session and is never persisted implicitly.

pub mod export;

pub use export::{ExportFormat, SessionExport};

use crate::error::{PalaverError, Result};
use crate::providers::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// System prompt sent with summarization requests
pub const SUMMARY_PROMPT: &str = "Please provide a concise summary of the following conversation:";

/// Who produced a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The human user
    User,
    /// The upstream model
    Assistant,
    /// Context injected by the client
    System,
}

impl Sender {
    /// Upstream role string
    pub fn role(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Label used in transcripts and text exports
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "AI",
            Self::System => "System",
        }
    }
}

/// A message in a session's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier (UUID v4)
    pub id: String,
    /// Message text
    pub content: String,
    /// Message author
    pub sender: Sender,
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::session::{ChatMessage, Sender};
    ///
    /// let msg = ChatMessage::new(Sender::User, "Hello");
    /// assert_eq!(msg.content, "Hello");
    /// assert_eq!(msg.id.len(), 36);
    /// ```
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    fn to_upstream(&self) -> Message {
        Message {
            role: self.sender.role().to_string(),
            content: self.content.clone(),
        }
    }
}

/// Cumulative usage counters for a session
///
/// Counters only ever increase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Tokens charged to the session
    pub token_count: u64,
    /// Successful upstream calls
    pub api_calls: u64,
    /// Estimated cost in dollars
    pub cost_estimate: f64,
}

impl UsageMetrics {
    /// Record one upstream call
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::session::UsageMetrics;
    ///
    /// let mut metrics = UsageMetrics::default();
    /// metrics.record(1500, 0.01);
    /// assert_eq!(metrics.api_calls, 1);
    /// assert!((metrics.cost_estimate - 0.015).abs() < 1e-12);
    /// ```
    pub fn record(&mut self, tokens: usize, cost_per_1k_tokens: f64) {
        self.token_count = self.token_count.saturating_add(tokens as u64);
        self.api_calls = self.api_calls.saturating_add(1);
        self.cost_estimate += tokens as f64 / 1000.0 * cost_per_1k_tokens.max(0.0);
    }
}

/// A file attached to a session as conversation context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Path as given by the caller
    pub path: PathBuf,
    /// Optional caller description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File contents at attach time
    pub content: String,
    /// When the file was attached
    pub attached_at: DateTime<Utc>,
}

impl Attachment {
    /// Render the attachment as a system context message
    fn to_upstream(&self) -> Message {
        let mut header = format!("Attached file: {}", self.path.display());
        if let Some(description) = &self.description {
            header.push_str(&format!(" ({})", description));
        }
        Message::system(format!("{}\n\n```\n{}\n```", header, self.content))
    }
}

/// A live conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque session identifier (UUID v4)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Model used for subsequent sends
    pub model: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
    attachments: Vec<Attachment>,
    metrics: UsageMetrics,
}

impl Session {
    /// Create an empty session with a fresh identifier
    pub fn new(user_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            model: model.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
            attachments: Vec::new(),
            metrics: UsageMetrics::default(),
        }
    }

    /// Messages in send order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The last `limit` messages, or all of them
    pub fn history(&self, limit: Option<usize>) -> &[ChatMessage] {
        match limit {
            Some(limit) if limit < self.messages.len() => {
                &self.messages[self.messages.len() - limit..]
            }
            _ => &self.messages,
        }
    }

    /// Attached files in attach order
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Usage counters
    pub fn metrics(&self) -> UsageMetrics {
        self.metrics
    }

    /// Append a user message and its reply as one step
    pub fn push_exchange(&mut self, user: ChatMessage, assistant: ChatMessage) {
        self.messages.push(user);
        self.messages.push(assistant);
    }

    /// Add a file to the conversation context
    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Charge one upstream call to the session
    pub fn record_usage(&mut self, tokens: usize, cost_per_1k_tokens: f64) {
        self.metrics.record(tokens, cost_per_1k_tokens);
    }

    /// Build the upstream conversation for a new user message
    ///
    /// Attachment context comes first as system messages, followed by the
    /// existing log and the new message.
    pub fn upstream_messages(&self, new_user_text: &str) -> Vec<Message> {
        self.attachments
            .iter()
            .map(Attachment::to_upstream)
            .chain(self.messages.iter().map(ChatMessage::to_upstream))
            .chain(std::iter::once(Message::user(new_user_text)))
            .collect()
    }

    /// Plain transcript of the log, used for summarization
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::session::{ChatMessage, Sender, Session};
    ///
    /// let mut session = Session::new("alice", "mock-gpt-4");
    /// session.push_exchange(
    ///     ChatMessage::new(Sender::User, "Hi"),
    ///     ChatMessage::new(Sender::Assistant, "Hello"),
    /// );
    /// assert_eq!(session.transcript(), "User: Hi\n\nAI: Hello\n\n");
    /// ```
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.sender != Sender::System)
            .map(|m| format!("{}: {}\n\n", m.sender.label(), m.content))
            .collect()
    }

    /// Short listing of the session
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            user_id: self.user_id.clone(),
            model: self.model.clone(),
            created_at: self.created_at,
            message_count: self.messages.len(),
            metrics: self.metrics,
        }
    }
}

/// Listing entry for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// Current model
    pub model: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Number of messages in the log
    pub message_count: usize,
    /// Usage counters
    pub metrics: UsageMetrics,
}

/// In-memory table of live sessions
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and insert a new session, returning its identifier
    pub fn create(&mut self, user_id: &str, model: &str) -> String {
        let session = Session::new(user_id, model);
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session);
        id
    }

    /// Insert an existing session record
    ///
    /// # Errors
    ///
    /// Returns invalid input if a session with the same identifier is live
    pub fn insert(&mut self, session: Session) -> Result<()> {
        if self.sessions.contains_key(&session.id) {
            return Err(PalaverError::InvalidInput(format!(
                "Session {} is already active",
                session.id
            ))
            .into());
        }
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    /// Look up a live session
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown identifiers
    pub fn get(&self, session_id: &str) -> Result<&Session> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| PalaverError::SessionNotFound(session_id.to_string()).into())
    }

    /// Look up a live session for mutation
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown identifiers
    pub fn get_mut(&mut self, session_id: &str) -> Result<&mut Session> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| PalaverError::SessionNotFound(session_id.to_string()).into())
    }

    /// Remove a session, returning it if it was live
    pub fn remove(&mut self, session_id: &str) -> Option<Session> {
        self.sessions.remove(session_id)
    }

    /// Live sessions ordered by creation time
    pub fn list(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        sessions
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

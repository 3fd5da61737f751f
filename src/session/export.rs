//! Session export and import
//!
//! Sessions serialize to an indented JSON document (re-parseable with
//! [`SessionExport::parse`]) or a human-readable text transcript.

use super::{Attachment, ChatMessage, Session, UsageMetrics};
use crate::error::{PalaverError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Indented JSON document
    Json,
    /// Plain text transcript
    Text,
}

impl FromStr for ExportFormat {
    type Err = PalaverError;

    /// Parse a format name, case-insensitively
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::session::ExportFormat;
    ///
    /// assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
    /// assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
    /// assert!("xml".parse::<ExportFormat>().is_err());
    /// ```
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" | "text" => Ok(Self::Text),
            _ => Err(PalaverError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "txt"),
        }
    }
}

/// Serializable snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    /// Session identifier
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// Model in use at export time
    pub model: String,
    /// Session creation time
    pub created_at: DateTime<Utc>,
    /// Ordered message log
    pub messages: Vec<ChatMessage>,
    /// Attached files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Usage counters
    #[serde(default)]
    pub metrics: UsageMetrics,
}

impl SessionExport {
    /// Snapshot a session
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            user_id: session.user_id.clone(),
            model: session.model.clone(),
            created_at: session.created_at,
            messages: session.messages().to_vec(),
            attachments: session.attachments().to_vec(),
            metrics: session.metrics(),
        }
    }

    /// Re-parse the JSON form
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the document is malformed, or invalid
    /// input if it lacks a session or user identifier
    pub fn parse(json: &str) -> Result<Self> {
        let export: Self = serde_json::from_str(json).map_err(PalaverError::Serialization)?;
        if export.session_id.trim().is_empty() {
            return Err(PalaverError::InvalidInput("Session ID cannot be empty".to_string()).into());
        }
        if export.user_id.trim().is_empty() {
            return Err(PalaverError::InvalidInput("User ID cannot be empty".to_string()).into());
        }
        Ok(export)
    }

    /// Rebuild a live session record
    pub fn into_session(self) -> Session {
        Session {
            id: self.session_id,
            user_id: self.user_id,
            model: self.model,
            created_at: self.created_at,
            messages: self.messages,
            attachments: self.attachments,
            metrics: self.metrics,
        }
    }

    /// Render in the requested format
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails
    pub fn render(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => self.to_json(),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Indented JSON document
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(PalaverError::Serialization)?)
    }

    /// Text transcript with a header block
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Session ID: {}", self.session_id);
        let _ = writeln!(output, "User ID: {}", self.user_id);
        let _ = writeln!(output, "Model: {}", self.model);
        let _ = writeln!(output, "Created: {}", self.created_at.to_rfc3339());
        output.push('\n');
        output.push_str("Conversation:\n\n");

        for msg in &self.messages {
            let _ = write!(
                output,
                "[{}] {}: {}\n\n",
                msg.timestamp.format("%Y-%m-%d %H:%M:%S"),
                msg.sender.label(),
                msg.content
            );
        }

        output
    }
}

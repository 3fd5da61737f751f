use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing entry for an archived session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedSession {
    /// Session identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Model at archive time
    pub model: String,
    /// When the session was started
    pub created_at: DateTime<Utc>,
    /// When the session was last archived
    pub archived_at: DateTime<Utc>,
    /// Number of messages in the log
    pub message_count: usize,
    /// Tokens charged to the session
    pub token_count: u64,
}

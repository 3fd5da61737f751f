//! Palaver - session-based chat client library
//!
//! This library manages chat sessions against hosted language-model APIs:
//! message history, per-session usage accounting, model switching, file
//! attachments, summaries and export.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `client`: The conversation client that owns sessions and the provider
//! - `session`: Session state, usage counters and export formats
//! - `providers`: Upstream provider abstraction (Cerebras, offline mock)
//! - `storage`: SQLite archive of exported sessions
//! - `metrics`: Upstream call instrumentation
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and its handlers
//!
//! # Example
//!
//! ```no_run
//! use palaver::{Config, ConversationClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let mut client = ConversationClient::from_config(&config)?;
//!     let session = client.start_new_session("alice", None)?;
//!     let reply = client.send_message(&session, "Hello!").await?;
//!     println!("{}", reply.response);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use client::{ConversationClient, MessageResponse};
pub use config::Config;
pub use error::{PalaverError, Result};

#[cfg(test)]
pub mod test_utils;

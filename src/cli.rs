//! Command-line interface definition for Palaver
//!
//! This module defines the CLI structure using clap's derive API. Apart from
//! `chat`, every subcommand operates on sessions archived with `chat --save`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Palaver - session-based chat client for hosted language models
#[derive(Parser, Debug, Clone)]
#[command(name = "palaver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the provider from config (cerebras, mock)
    #[arg(short, long, global = true)]
    pub provider: Option<String>,

    /// Session archive database path
    #[arg(long, global = true)]
    pub archive: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Palaver
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Model to use (defaults to the provider's default model)
        #[arg(short, long)]
        model: Option<String>,

        /// Resume an archived session (full id or 8-char prefix)
        #[arg(short, long)]
        session_id: Option<String>,

        /// Archive the session when the chat ends
        #[arg(long)]
        save: bool,

        /// User identifier recorded on the session
        #[arg(short, long, env = "USER", default_value = "cli-user")]
        user: String,
    },

    /// List the provider's models
    Models {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List archived sessions
    Sessions {
        /// Delete the archived session with this id or prefix instead
        #[arg(long, value_name = "SESSION_ID")]
        delete: Option<String>,
    },

    /// Export an archived session
    Export {
        /// Session id or 8-char prefix
        session_id: String,

        /// Output format (json, txt)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show usage metrics of an archived session
    Metrics {
        /// Session id or 8-char prefix
        session_id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Summarize an archived session
    Summarize {
        /// Session id or 8-char prefix
        session_id: String,

        /// Write the summary to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Attach a text file to an archived session
    Attach {
        /// Session id or 8-char prefix
        session_id: String,

        /// File to attach
        file: PathBuf,

        /// Description sent along with the file
        #[arg(short, long)]
        description: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            provider: None,
            archive: None,
            command: Commands::Models { json: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Models { json: false }));
    }

    #[test]
    fn test_cli_parse_chat() {
        let cli = Cli::try_parse_from([
            "palaver",
            "chat",
            "--model",
            "llama3.1-8b",
            "--save",
            "--user",
            "alice",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                model,
                session_id,
                save,
                user,
            } => {
                assert_eq!(model.as_deref(), Some("llama3.1-8b"));
                assert!(session_id.is_none());
                assert!(save);
                assert_eq!(user, "alice");
            }
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_cli_parse_chat_resume() {
        let cli = Cli::try_parse_from(["palaver", "chat", "-s", "abcd1234"]).unwrap();
        if let Commands::Chat { session_id, .. } = cli.command {
            assert_eq!(session_id.as_deref(), Some("abcd1234"));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "palaver",
            "models",
            "--provider",
            "mock",
            "--archive",
            "/tmp/a.db",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("mock"));
        assert_eq!(cli.archive.as_deref(), Some("/tmp/a.db"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::try_parse_from([
            "palaver", "export", "abcd1234", "--format", "txt", "-o", "out.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Export {
                session_id,
                format,
                output,
            } => {
                assert_eq!(session_id, "abcd1234");
                assert_eq!(format, "txt");
                assert_eq!(output, Some(PathBuf::from("out.txt")));
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_cli_parse_export_default_format() {
        let cli = Cli::try_parse_from(["palaver", "export", "abcd1234"]).unwrap();
        if let Commands::Export { format, .. } = cli.command {
            assert_eq!(format, "json");
        } else {
            panic!("Expected Export command");
        }
    }

    #[test]
    fn test_cli_parse_attach() {
        let cli = Cli::try_parse_from([
            "palaver",
            "attach",
            "abcd1234",
            "notes.md",
            "--description",
            "meeting notes",
        ])
        .unwrap();
        match cli.command {
            Commands::Attach {
                session_id,
                file,
                description,
            } => {
                assert_eq!(session_id, "abcd1234");
                assert_eq!(file, PathBuf::from("notes.md"));
                assert_eq!(description.as_deref(), Some("meeting notes"));
            }
            _ => panic!("Expected Attach command"),
        }
    }

    #[test]
    fn test_cli_parse_sessions_delete() {
        let cli = Cli::try_parse_from(["palaver", "sessions", "--delete", "abcd"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions { delete: Some(ref id) } if id == "abcd"
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["palaver"]).is_err());
    }

    #[test]
    fn test_cli_summarize_requires_session_id() {
        assert!(Cli::try_parse_from(["palaver", "summarize"]).is_err());
    }
}

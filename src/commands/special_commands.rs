//! Special commands parser for interactive chat
//!
//! Lines starting with `/` are commands handled by the chat loop instead of
//! being sent upstream. `exit` and `quit` also work without the slash.
//! Command words are case-insensitive; arguments keep their case.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Command was given an argument it does not accept
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Commands understood by the chat loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show command help
    Help,
    /// Show the provider's models
    ListModels,
    /// Show the session's current model
    ShowModel,
    /// Switch the session to another model
    SwitchModel(String),
    /// Show usage counters
    Metrics,
    /// Print the session in a format (defaults to json)
    Export(Option<String>),
    /// Summarize the conversation
    Summarize,
    /// Attach a file as context
    Attach {
        /// File path
        path: String,
        /// Optional description
        description: Option<String>,
    },
    /// Show the last N messages (all when absent)
    History(Option<usize>),
    /// List archived sessions
    Sessions,
    /// Leave the chat
    Exit,
    /// Not a special command; send upstream
    None,
}

/// Parse a line of chat input
///
/// # Examples
///
/// ```
/// use palaver::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/METRICS").unwrap(), SpecialCommand::Metrics);
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match command.as_str() {
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/models" => Ok(SpecialCommand::ListModels),
        "/model" if rest.is_empty() => Ok(SpecialCommand::ShowModel),
        "/model" => Ok(SpecialCommand::SwitchModel(rest.to_string())),
        "/metrics" => Ok(SpecialCommand::Metrics),
        "/export" if rest.is_empty() => Ok(SpecialCommand::Export(None)),
        "/export" => Ok(SpecialCommand::Export(Some(rest.to_string()))),
        "/summarize" | "/summary" => Ok(SpecialCommand::Summarize),
        "/sessions" => Ok(SpecialCommand::Sessions),
        "/history" if rest.is_empty() => Ok(SpecialCommand::History(None)),
        "/history" => rest
            .parse()
            .map(|n| SpecialCommand::History(Some(n)))
            .map_err(|_| CommandError::UnsupportedArgument {
                command: "/history".to_string(),
                arg: rest.to_string(),
            }),
        "/attach" if rest.is_empty() => Err(CommandError::MissingArgument {
            command: "/attach".to_string(),
            usage: "/attach <path> [description]".to_string(),
        }),
        "/attach" => {
            let (path, description) = match rest.split_once(char::is_whitespace) {
                Some((path, description)) => (path, Some(description.trim().to_string())),
                None => (rest, None),
            };
            Ok(SpecialCommand::Attach {
                path: path.to_string(),
                description: description.filter(|d| !d.is_empty()),
            })
        }
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the command reference
pub fn print_help() {
    println!(
        r#"
Chat Commands
=============

  /help               - Show this help
  /models             - List available models
  /model              - Show the current model
  /model <id>         - Switch to another model
  /metrics            - Show token, call and cost counters
  /history [n]        - Show the last n messages (default: all)
  /export [json|txt]  - Print the conversation (default: json)
  /summarize          - Summarize the conversation
  /attach <path> [description]
                      - Attach a text file as context
  /sessions           - List archived sessions
  exit, quit          - Leave the chat
"#
    );
}

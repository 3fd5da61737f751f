/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`: interactive chat session
- `archive`: one-shot commands over archived sessions (sessions, export,
  metrics, summarize, attach)

Handlers are thin wrappers over [`ConversationClient`] and
[`SessionArchive`].
*/

use crate::client::ConversationClient;
use crate::config::Config;
use crate::error::{PalaverError, Result};
use crate::session::SessionExport;
use crate::storage::SessionArchive;
use std::path::Path;

// Terminal rendering of replies and metrics
pub mod format;

// Model listing
pub mod models;

// Special commands parser for the chat loop
pub mod special_commands;

/// Open the archive selected by the configuration
fn open_archive(config: &Config) -> Result<SessionArchive> {
    SessionArchive::open(&config.client)
}

/// Load an archived session by full id or prefix
fn load_export(archive: &SessionArchive, id: &str) -> Result<SessionExport> {
    Ok(archive
        .load(id)?
        .ok_or_else(|| PalaverError::SessionNotFound(id.to_string()))?)
}

/// Restore an archived session into a fresh client
///
/// The client may substitute its provider's default model; returns the
/// client and the full session id.
fn load_archived(
    config: &Config,
    export: &SessionExport,
) -> Result<(ConversationClient, String)> {
    let mut client = ConversationClient::from_config(config)?;
    let session_id = client.import_session(&export.to_json()?)?;
    Ok((client, session_id))
}

/// Archive the client's copy of a session under its archived model
fn save_back(
    archive: &SessionArchive,
    client: &ConversationClient,
    session_id: &str,
    archived_model: &str,
) -> Result<()> {
    let mut export = client.export_session(session_id)?;
    export.model = archived_model.to_string();
    archive.save(&export)
}

/// Write `content` to `output`, or stdout when absent
fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            tracing::info!("Wrote {} bytes to {}", content.len(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Starts (or resumes) a session on the conversation client and runs a
    //! readline loop that sends each line upstream, handling `/` commands
    //! locally.

    use super::*;
    use crate::commands::format::{display_metrics, format_ai_response};
    use crate::commands::models::models_table;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::session::ExportFormat;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Options for [`run_chat`]
    #[derive(Debug, Clone, Default)]
    pub struct ChatOptions {
        /// Model for a new session, or to switch a resumed one to
        pub model: Option<String>,
        /// Archived session to resume
        pub session_id: Option<String>,
        /// Archive the session on exit
        pub save: bool,
        /// User id for a new session
        pub user: String,
    }

    /// Start interactive chat mode
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be started or resumed; failures of
    /// individual messages are printed and the loop continues
    pub async fn run_chat(config: Config, options: ChatOptions) -> Result<()> {
        let (mut client, session_id) = match &options.session_id {
            Some(id) => {
                let archive = open_archive(&config)?;
                let export = load_export(&archive, id)?;
                let (mut client, session_id) = load_archived(&config, &export)?;
                client.provider().check_credentials()?;
                if let Some(model) = &options.model {
                    client.switch_model(&session_id, model)?;
                }
                tracing::info!("Resumed session {}", session_id);
                (client, session_id)
            }
            None => {
                let mut client = ConversationClient::from_config(&config)?;
                let session_id =
                    client.start_new_session(&options.user, options.model.as_deref())?;
                (client, session_id)
            }
        };

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner(&client, &session_id)?;

        loop {
            match rl.readline(&format!("{} ", "you>".green().bold())) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            match client.send_message(&session_id, trimmed).await {
                                Ok(reply) => {
                                    println!(
                                        "\n{} {}\n",
                                        "AI:".cyan().bold(),
                                        format_ai_response(&reply.response)
                                    );
                                }
                                Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
                            }
                        }
                        other => {
                            if let Err(e) =
                                handle_special_command(&mut client, &config, &session_id, other)
                                    .await
                            {
                                eprintln!("{}\n", format!("Error: {}", e).red());
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        display_metrics(&client.get_usage_metrics(&session_id)?);

        if options.save {
            let archive = open_archive(&config)?;
            archive.save(&client.export_session(&session_id)?)?;
            println!(
                "\nSession saved: {} ({})",
                session_id.bold(),
                archive.path().display()
            );
        }

        client.end_session(&session_id);
        println!("Goodbye!");
        Ok(())
    }

    /// Execute a special command against the live session
    async fn handle_special_command(
        client: &mut ConversationClient,
        config: &Config,
        session_id: &str,
        command: SpecialCommand,
    ) -> Result<()> {
        match command {
            SpecialCommand::Help => print_help(),
            SpecialCommand::ListModels => {
                let current = client.export_session(session_id)?.model;
                models_table(&client.list_available_models(), Some(&current)).printstd();
                println!();
            }
            SpecialCommand::ShowModel => {
                let current = client.export_session(session_id)?.model;
                println!("Current model: {}\n", current.cyan());
            }
            SpecialCommand::SwitchModel(model) => {
                client.switch_model(session_id, &model)?;
                println!("Switched to model {}\n", model.cyan());
            }
            SpecialCommand::Metrics => {
                display_metrics(&client.get_usage_metrics(session_id)?);
                println!();
            }
            SpecialCommand::History(limit) => {
                for message in client.get_chat_history(session_id, limit)? {
                    println!(
                        "[{}] {}: {}",
                        message.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        message.sender.label(),
                        message.content
                    );
                }
                println!();
            }
            SpecialCommand::Export(format) => {
                let format: ExportFormat = format.as_deref().unwrap_or("json").parse()?;
                println!("{}", client.export_chat_history(session_id, format)?);
            }
            SpecialCommand::Summarize => {
                println!("{}", "Summarizing conversation...".dimmed());
                let summary = client.summarize_conversation(session_id).await?;
                println!("\n{}\n{}\n", "Summary:".bold(), format_ai_response(&summary));
            }
            SpecialCommand::Attach { path, description } => {
                client
                    .attach_file(session_id, &path, description.as_deref())
                    .await?;
                println!("{}\n", format!("Attached {}", path).green());
            }
            SpecialCommand::Sessions => {
                let archive = open_archive(config)?;
                super::archive::print_sessions(&archive)?;
            }
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    fn print_welcome_banner(client: &ConversationClient, session_id: &str) -> Result<()> {
        let session = client.export_session(session_id)?;
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Palaver Interactive Chat                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session:  {}", session.session_id.bold());
        println!("Provider: {}", client.provider().name().cyan());
        println!("Model:    {}", session.model.cyan());
        if !session.messages.is_empty() {
            println!("History:  {} messages", session.messages.len());
        }
        println!("\nType '/help' for available commands, 'exit' to quit\n");
        Ok(())
    }
}

// One-shot commands over archived sessions
pub mod archive {
    //! Handlers for `sessions`, `export`, `metrics`, `summarize` and
    //! `attach`.
    //!
    //! Each loads the archived session into a fresh client, performs one
    //! client operation and, if the session changed, archives it again.

    use super::*;
    use crate::commands::format::display_metrics;
    use crate::session::ExportFormat;
    use colored::Colorize;
    use prettytable::{row, Table};
    use std::path::PathBuf;

    /// Print a table of archived sessions
    pub fn print_sessions(archive: &SessionArchive) -> Result<()> {
        let sessions = archive.list()?;
        if sessions.is_empty() {
            println!("No archived sessions in {}", archive.path().display());
            return Ok(());
        }

        let mut table = Table::new();
        table.add_row(row!["ID", "User", "Model", "Messages", "Tokens", "Archived"]);
        for session in sessions {
            table.add_row(row![
                session.id.chars().take(8).collect::<String>(),
                session.user_id,
                session.model,
                session.message_count,
                session.token_count,
                session.archived_at.format("%Y-%m-%d %H:%M")
            ]);
        }
        table.printstd();
        Ok(())
    }

    /// List archived sessions, or delete one
    pub fn sessions(config: &Config, delete: Option<String>) -> Result<()> {
        let archive = open_archive(config)?;
        match delete {
            Some(id) => {
                if archive.delete(&id)? {
                    println!("Deleted session {}", id);
                    Ok(())
                } else {
                    Err(PalaverError::SessionNotFound(id).into())
                }
            }
            None => print_sessions(&archive),
        }
    }

    /// Export an archived session
    pub fn export(
        config: &Config,
        session_id: &str,
        format: &str,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let format: ExportFormat = format.parse()?;
        let export = load_export(&open_archive(config)?, session_id)?;
        write_output(&export.render(format)?, output.as_deref())
    }

    /// Show usage counters of an archived session
    pub fn metrics(config: &Config, session_id: &str, json: bool) -> Result<()> {
        let export = load_export(&open_archive(config)?, session_id)?;
        let metrics = export.metrics;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&metrics).map_err(PalaverError::Serialization)?
            );
        } else {
            println!("Session: {}", export.session_id);
            display_metrics(&metrics);
        }
        Ok(())
    }

    /// Summarize an archived session and archive the updated counters
    ///
    /// The archived model is kept even if the provider summarized with its
    /// own default.
    pub async fn summarize(
        config: &Config,
        session_id: &str,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let archive = open_archive(config)?;
        let export = load_export(&archive, session_id)?;
        let (mut client, session_id) = load_archived(config, &export)?;
        client.provider().check_credentials()?;

        let summary = client.summarize_conversation(&session_id).await?;
        save_back(&archive, &client, &session_id, &export.model)?;
        write_output(&summary, output.as_deref())
    }

    /// Attach a file to an archived session
    pub async fn attach(
        config: &Config,
        session_id: &str,
        file: PathBuf,
        description: Option<String>,
    ) -> Result<()> {
        let archive = open_archive(config)?;
        let export = load_export(&archive, session_id)?;
        let (mut client, session_id) = load_archived(config, &export)?;

        client
            .attach_file(&session_id, &file, description.as_deref())
            .await?;
        save_back(&archive, &client, &session_id, &export.model)?;
        println!(
            "{}",
            format!("Attached {} to session {}", file.display(), session_id).green()
        );
        Ok(())
    }
}

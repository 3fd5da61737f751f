//! Palaver - session-based chat client for hosted language models
//!
#![doc = "Main entry point for the Palaver CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use palaver::cli::{Cli, Commands};
use palaver::commands::{self, archive, chat::ChatOptions};
use palaver::config::Config;
use palaver::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);
    metrics::init_metrics_exporter();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat {
            model,
            session_id,
            save,
            user,
        } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(id) = &session_id {
                tracing::debug!("Resuming session: {}", id);
            }
            let options = ChatOptions {
                model,
                session_id,
                save,
                user,
            };
            commands::chat::run_chat(config, options).await
        }
        Commands::Models { json } => commands::models::list_models(&config, json),
        Commands::Sessions { delete } => archive::sessions(&config, delete),
        Commands::Export {
            session_id,
            format,
            output,
        } => archive::export(&config, &session_id, &format, output),
        Commands::Metrics { session_id, json } => archive::metrics(&config, &session_id, json),
        Commands::Summarize { session_id, output } => {
            archive::summarize(&config, &session_id, output).await
        }
        Commands::Attach {
            session_id,
            file,
            description,
        } => archive::attach(&config, &session_id, file, description).await,
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays pipeable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "palaver=debug"
    } else {
        "palaver=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

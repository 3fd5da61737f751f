//! Model listing for Palaver
//!
//! Model tables are static per provider, so listing never needs credentials
//! or network access.

use crate::config::Config;
use crate::error::{PalaverError, Result};
use crate::providers::{self, ModelInfo};
use prettytable::{row, Table};

/// List the models offered by the configured provider
///
/// # Examples
///
/// ```
/// use palaver::commands::models::list_models;
/// use palaver::config::Config;
///
/// let mut config = Config::default();
/// config.provider.provider_type = "mock".to_string();
/// list_models(&config, true).unwrap();
/// ```
pub fn list_models(config: &Config, json: bool) -> Result<()> {
    let provider_type = &config.provider.provider_type;
    tracing::info!("Listing models from provider: {}", provider_type);

    let provider = providers::create_provider(provider_type, &config.provider)?;
    let models = provider.list_models();

    if json {
        println!("{}", serialize_pretty(&models)?);
    } else {
        println!("\nAvailable models from {}:\n", provider_type);
        models_table(&models, Some(provider.default_model())).printstd();
        println!();
    }
    Ok(())
}

/// Build a table of models, marking `current` with an asterisk
pub fn models_table(models: &[ModelInfo], current: Option<&str>) -> Table {
    let mut table = Table::new();
    table.add_row(row![
        "Model ID",
        "Name",
        "Max Tokens",
        "Knowledge Cutoff",
        "Capabilities"
    ]);

    for model in models {
        let id = if current == Some(model.id.as_str()) {
            format!("{} *", model.id)
        } else {
            model.id.clone()
        };
        let name = if model.private_preview {
            format!("{} (preview)", model.name)
        } else {
            model.name.clone()
        };
        let capabilities = model
            .capabilities
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(row![
            id,
            name,
            format!("{} tokens", model.max_tokens),
            model.knowledge_cutoff.as_deref().unwrap_or("-"),
            capabilities
        ]);
    }

    table
}

fn serialize_pretty(models: &[ModelInfo]) -> Result<String> {
    Ok(serde_json::to_string_pretty(models).map_err(PalaverError::Serialization)?)
}

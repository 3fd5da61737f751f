use palaver::config::{ClientConfig, Config};
use palaver::storage::SessionArchive;
use palaver::ConversationClient;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn mock_config() -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "mock".to_string();
    config
}

#[allow(dead_code)]
pub fn mock_client() -> ConversationClient {
    ConversationClient::from_config(&mock_config()).expect("failed to create mock client")
}

/// Client config pointing at a Cerebras-compatible server at `uri`
#[allow(dead_code)]
pub fn cerebras_config(uri: &str) -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "cerebras".to_string();
    config.provider.cerebras.api_base = uri.to_string();
    config.provider.cerebras.api_key = Some("test-key".to_string());
    config.provider.cerebras.timeout_seconds = 2;
    config.client = ClientConfig {
        cost_per_1k_tokens: 0.01,
        ..ClientConfig::default()
    };
    config
}

#[allow(dead_code)]
pub fn create_temp_archive() -> (SessionArchive, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("sessions.db");
    let archive = SessionArchive::new_with_path(db_path).expect("failed to create archive");
    (archive, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

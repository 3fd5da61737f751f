//! Test utilities for Palaver
//!
//! Temporary directories, test files, assertion helpers and a provider that
//! always fails.

use crate::config::Config;
use crate::error::{PalaverError, Result};
use crate::providers::{CompletionRequest, CompletionResponse, ModelInfo, Provider};
use async_trait::async_trait;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// Cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error's message contains `expected`
///
/// # Panics
///
/// Panics if the result is Ok or if the message does not match
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Configuration using the offline mock provider
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "mock".to_string();
    config
}

/// Provider whose every completion fails with an upstream error
#[derive(Debug)]
pub struct FailingProvider {
    has_credentials: bool,
}

impl FailingProvider {
    /// A provider that also reports missing credentials
    pub fn without_credentials() -> Self {
        Self {
            has_credentials: false,
        }
    }
}

impl Default for FailingProvider {
    fn default() -> Self {
        Self {
            has_credentials: true,
        }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
        Err(PalaverError::Upstream("Failed to connect to upstream".to_string()).into())
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo::new("failing-model", "Failing Model", 1024)]
    }

    fn default_model(&self) -> &str {
        "failing-model"
    }

    fn check_credentials(&self) -> Result<()> {
        if self.has_credentials {
            Ok(())
        } else {
            Err(PalaverError::MissingCredentials("failing".to_string()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(PalaverError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_is_valid() {
        let config = test_config();
        assert_eq!(config.provider.provider_type, "mock");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let provider = FailingProvider::default();
        let request = CompletionRequest::new("failing-model", Vec::new(), 1);
        assert_error_contains(provider.complete(&request).await, "Failed to connect");
        assert!(FailingProvider::without_credentials()
            .check_credentials()
            .is_err());
    }
}

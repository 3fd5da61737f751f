//! Provider module for Palaver
//!
//! This module contains the upstream provider abstraction and implementations
//! for Cerebras and an offline mock.

pub mod base;
pub mod cerebras;
pub mod mock;

pub use base::{
    estimate_tokens, CompletionRequest, CompletionResponse, Message, ModelCapability, ModelInfo,
    Provider, TokenUsage,
};
pub use cerebras::CerebrasProvider;
pub use mock::MockProvider;

use crate::config::ProviderConfig;
use crate::config::PROVIDER_TYPES;
use crate::error::{PalaverError, Result};

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `provider_type` - Type of provider ("cerebras" or "mock")
/// * `config` - Provider configuration
///
/// # Errors
///
/// Returns a configuration error if the provider type is unknown or
/// initialization fails
///
/// # Examples
///
/// ```
/// use palaver::config::ProviderConfig;
/// use palaver::providers::create_provider;
///
/// let provider = create_provider("mock", &ProviderConfig::default()).unwrap();
/// assert_eq!(provider.name(), "mock");
/// ```
pub fn create_provider(provider_type: &str, config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match provider_type {
        "cerebras" => Ok(Box::new(CerebrasProvider::new(config.cerebras.clone())?)),
        "mock" => Ok(Box::new(MockProvider::new(config.mock.model.clone()))),
        _ => Err(PalaverError::Config(format!(
            "Unknown provider type: {}. Available providers: {}",
            provider_type,
            PROVIDER_TYPES.join(", ")
        ))
        .into()),
    }
}

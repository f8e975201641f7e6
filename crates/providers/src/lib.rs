//! Completion provider implementations for DiabeCare.
//!
//! [`OpenAiCompatProvider`] speaks the `/chat/completions` protocol that
//! Groq (the default), OpenAI and most hosted inference services expose.
//! [`CompletionClient`] wraps any `Provider` with the fixed sampling
//! parameters and turns every failure into a user-readable reply.

pub mod completion;
pub mod openai_compat;

use std::sync::Arc;

use diabecare_config::AppConfig;
use diabecare_core::error::ProviderError;
use diabecare_core::provider::Provider;

pub use completion::{CompletionClient, FailureKind};
pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// The caller is expected to have checked `require_api_key()` first; a
/// missing key here yields a provider that fails every call with an
/// authentication error.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider = OpenAiCompatProvider::new(
        &config.provider.name,
        &config.provider.base_url,
        config.api_key.clone().unwrap_or_default(),
        std::time::Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

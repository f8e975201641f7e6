//! Completion adapter — fixed sampling parameters and failure classification.
//!
//! [`CompletionClient::complete`] never returns an error. A provider failure
//! becomes one of four user-facing replies, chosen by [`FailureKind`]:
//!
//! 1. the model is unavailable or decommissioned
//! 2. the API key is rejected
//! 3. the provider is rate limiting
//! 4. anything else, with the provider's message embedded
//!
//! Typed [`ProviderError`] variants are classified directly. Unstructured
//! errors fall back to keyword matching on the provider's raw message, in
//! the order above.

use std::sync::Arc;

use diabecare_config::RECOMMENDED_MODEL;
use diabecare_core::error::ProviderError;
use diabecare_core::message::ChatTurn;
use diabecare_core::provider::{Provider, ProviderRequest};
use tracing::{debug, warn};

pub const API_KEY_ERROR_REPLY: &str =
    "❌ API Key Error: Please check your GROQ_API_KEY in the .env file.";

pub const RATE_LIMIT_REPLY: &str =
    "⏳ Rate Limit: Too many requests. Please wait a moment and try again.";

/// Sampling parameters sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 800,
            top_p: 1.0,
        }
    }
}

/// The user-facing category of a provider failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Model,
    Credentials,
    RateLimit,
    Other(String),
}

impl FailureKind {
    /// Classify a provider error, preferring its structured variant.
    pub fn classify(err: &ProviderError) -> Self {
        match err {
            ProviderError::ModelNotFound(_) => Self::Model,
            ProviderError::AuthenticationFailed(_) => Self::Credentials,
            ProviderError::RateLimited { .. } => Self::RateLimit,
            other => Self::from_message(other.raw_message()),
        }
    }

    /// Keyword fallback for errors with no structured signal.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if mentions(&["model", "decommission"]) {
            Self::Model
        } else if mentions(&["api", "key"]) {
            Self::Credentials
        } else if mentions(&["rate", "limit"]) {
            Self::RateLimit
        } else {
            Self::Other(message.to_string())
        }
    }

    /// Render the reply shown to the user.
    pub fn reply(&self, model: &str) -> String {
        match self {
            Self::Model => format!(
                "❌ Model Error: The model '{model}' is not available. \
                 Please update MODEL_NAME in .env to '{RECOMMENDED_MODEL}'"
            ),
            Self::Credentials => API_KEY_ERROR_REPLY.to_string(),
            Self::RateLimit => RATE_LIMIT_REPLY.to_string(),
            Self::Other(message) => format!("❌ Error: {message}"),
        }
    }
}

/// Wraps a [`Provider`] with the service's model and sampling parameters.
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    params: SamplingParams,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            params: SamplingParams::default(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, messages: Vec<ChatTurn>) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.params.temperature,
            max_tokens: Some(self.params.max_tokens),
            top_p: Some(self.params.top_p),
            stream: false,
        }
    }

    /// Send `messages` and return the trimmed reply, or the provider error.
    pub async fn try_complete(&self, messages: Vec<ChatTurn>) -> Result<String, ProviderError> {
        let response = self.provider.complete(self.request(messages)).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion finished"
            );
        }
        Ok(response.content.trim().to_string())
    }

    /// Send `messages` and return the trimmed reply. Failures are returned
    /// as classified reply text.
    pub async fn complete(&self, messages: Vec<ChatTurn>) -> String {
        match self.try_complete(messages).await {
            Ok(reply) => reply,
            Err(err) => {
                let kind = FailureKind::classify(&err);
                warn!(
                    provider = %self.provider.name(),
                    error = %err,
                    category = ?kind,
                    "Completion failed"
                );
                kind.reply(&self.model)
            }
        }
    }
}

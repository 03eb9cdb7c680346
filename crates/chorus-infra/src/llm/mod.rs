//! LLM provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `chorus-core`, plus [`create_provider`], the factory the agent registry
//! uses to build one provider per persona override.
//!
//! [`LlmProvider`]: chorus_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use chorus_core::llm::box_provider::BoxLlmProvider;
use chorus_types::llm::{LlmConfig, LlmError, ProviderType};

use crate::secret::resolve_api_key;

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;

/// Request timeout for generation calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Create a [`BoxLlmProvider`] from an [`LlmConfig`], reading the API key
/// from the environment variable the config names.
///
/// Has the signature of a `ProviderFactory`, so it can be handed to the
/// agent registry directly.
pub fn create_provider(config: &LlmConfig) -> Result<BoxLlmProvider, LlmError> {
    let api_key = resolve_api_key(config.api_key_env.as_deref());
    create_provider_with_key(config, api_key)
}

/// Create a [`BoxLlmProvider`] with an already-resolved key.
///
/// Anthropic requires a key. OpenAI-compatible servers may run without
/// one (local inference servers), so a missing key is allowed there.
pub fn create_provider_with_key(
    config: &LlmConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let provider = match config.provider_type {
        ProviderType::Anthropic => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            let mut provider = AnthropicProvider::new(key, config.model.clone())?;
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            BoxLlmProvider::new(provider)
        }
        ProviderType::OpenAiCompatible => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| openai_compat::default_base_url(&config.name).to_string());
            let provider = OpenAiCompatibleProvider::new(
                config.name.clone(),
                base_url,
                api_key,
                config.model.clone(),
            );
            BoxLlmProvider::new(provider)
        }
    };

    tracing::debug!(
        provider = provider.name(),
        model = provider.model(),
        "Created LLM provider"
    );
    Ok(provider)
}

/// Build the shared HTTP client, mapping builder failures to `LlmError`.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Provider {
            message: format!("failed to create HTTP client: {e}"),
        })
}

/// Map a non-success HTTP status to the matching `LlmError`.
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        503 | 529 => LlmError::Overloaded(body),
        400 => LlmError::InvalidRequest(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

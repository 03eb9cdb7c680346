//! Provider factory seam.
//!
//! The agent registry builds one provider for the shared default config and
//! one per persona override. It does so through this trait so the core never
//! names a concrete HTTP client.

use chorus_types::llm::{LlmConfig, LlmError};

use super::box_provider::BoxLlmProvider;

/// Builds a type-erased provider from configuration.
///
/// The infra crate implements this for real backends; tests plug in
/// scripted providers.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, config: &LlmConfig) -> Result<BoxLlmProvider, LlmError>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&LlmConfig) -> Result<BoxLlmProvider, LlmError> + Send + Sync,
{
    fn create(&self, config: &LlmConfig) -> Result<BoxLlmProvider, LlmError> {
        self(config)
    }
}

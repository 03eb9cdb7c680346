//! LLM provider abstractions for Chorus.
//!
//! This module defines the core traits for LLM provider integration:
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ProviderFactory`: builds providers from `LlmConfig` at registration time

pub mod box_provider;
pub mod factory;
pub mod provider;

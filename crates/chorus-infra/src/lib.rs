//! Infrastructure implementations for Chorus.
//!
//! Concrete adapters for the ports defined in `chorus-core`: HTTP LLM
//! providers, the remote memory backend, and the `chorus.toml` loader.

pub mod config;
pub mod llm;
pub mod memory;
pub mod secret;

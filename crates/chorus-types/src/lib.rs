//! Shared domain types for Chorus.
//!
//! This crate contains the core domain types used across the Chorus engine:
//! turns, sessions, personas, long-term memory records, engine configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;

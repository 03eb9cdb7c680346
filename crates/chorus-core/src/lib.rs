//! Conversation-state and orchestration logic for Chorus.
//!
//! This crate defines the "ports" (provider and memory backend traits) that
//! the infrastructure layer implements, plus everything that decides what
//! goes into a prompt and which persona speaks next. It depends only on
//! `chorus-types` -- never on `chorus-infra` or any HTTP crate.

pub mod agent;
pub mod chat;
pub mod llm;
pub mod memory;

#[cfg(test)]
pub(crate) mod test_support;

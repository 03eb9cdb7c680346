//! Personas and orchestration for Chorus.
//!
//! - `AgentRegistry`: personas, their providers and selection
//! - `prompt`: group-chat system prompt with the persona roster
//! - `ChainController`: bounded persona-to-persona follow-ups
//! - `ConversationEngine`: the per-message flow tying it all together

pub mod chain;
pub mod engine;
pub mod prompt;
pub mod registry;

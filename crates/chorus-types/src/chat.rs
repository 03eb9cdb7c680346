//! Session, turn, and summary types for Chorus.
//!
//! These types model conversations between users and personas: sessions,
//! the turns inside them, and compaction summaries produced by the sliding
//! window manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

use crate::llm::Message;

/// Platform name used when a session id carries no platform prefix.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Composite session identifier: `platform:user_id` or
/// `platform:group_id:user_id`.
///
/// Chat adapters build keys with [`SessionKey::new`]; the context store
/// parses incoming ids to fill in [`Session`] metadata on first contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub platform: String,
    pub user_id: String,
    pub group_id: Option<String>,
}

impl SessionKey {
    pub fn new(
        platform: impl Into<String>,
        user_id: impl Into<String>,
        group_id: Option<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            user_id: user_id.into(),
            group_id,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group_id {
            Some(group) => write!(f, "{}:{}:{}", self.platform, group, self.user_id),
            None => write!(f, "{}:{}", self.platform, self.user_id),
        }
    }
}

impl FromStr for SessionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("empty session id".to_string());
        }

        let parts: Vec<&str> = s.splitn(3, ':').collect();
        let key = match parts.as_slice() {
            [user] => SessionKey::new(UNKNOWN_PLATFORM, *user, None),
            [platform, user] => SessionKey::new(*platform, *user, None),
            [platform, group, user] => {
                SessionKey::new(*platform, *user, Some((*group).to_string()))
            }
            _ => return Err(format!("invalid session id: '{s}'")),
        };
        Ok(key)
    }
}

/// A conversation between one user (or group) and the engine on a platform.
///
/// Created on the first message for a session id and touched on every
/// message after that. Sessions are never destroyed automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub platform: String,
    pub user_id: String,
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Build a fresh session from a composite id, falling back to the
    /// unknown platform when the id does not parse.
    pub fn from_id(id: &str, now: DateTime<Utc>) -> Self {
        let key = id
            .parse::<SessionKey>()
            .unwrap_or_else(|_| SessionKey::new(UNKNOWN_PLATFORM, id, None));
        Self {
            id: id.to_string(),
            platform: key.platform,
            user_id: key.user_id,
            group_id: key.group_id,
            created_at: now,
            last_active_at: now,
        }
    }
}

/// A single message within a session.
///
/// Immutable once created. Ordering inside a session is insertion order.
/// Assistant turns produced by a persona carry that persona's `agent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl Turn {
    /// Project this turn onto the provider-agnostic LLM message shape.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A turn before the context store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTurn {
    pub role: MessageRole,
    pub content: String,
    pub agent_id: Option<String>,
}

impl NewTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            agent_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            agent_id: Some(agent_id.into()),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            agent_id: None,
        }
    }
}

/// Compacted text standing in for an older prefix of a session's turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: Uuid,
    pub session_id: String,
    pub content: String,
    /// Number of turns this summary replaced.
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Counters reported by `get_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStats {
    /// Turns currently in the live window.
    pub message_count: usize,
    /// Summaries stored for the session.
    pub summary_count: usize,
}

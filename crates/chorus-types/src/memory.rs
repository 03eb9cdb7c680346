//! Memory types for Chorus.
//!
//! These types model the long-term memory kept per user: facts and
//! preferences extracted from conversations that persist across sessions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Free-form metadata attached to a memory record.
pub type MemoryMetadata = HashMap<String, serde_json::Value>;

/// Metadata key naming the heuristic that kept a record.
pub const CATEGORY_KEY: &str = "category";

/// Metadata key holding the id of the turn a record was extracted from.
pub const TURN_ID_KEY: &str = "turn_id";

/// Which importance heuristic matched when a turn was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    /// "my name is ...", "call me ..."
    Identity,
    /// "I like ...", "my favorite ..."
    Preference,
    /// "I work as ...", "I'm a developer"
    Occupation,
    /// "I live in ...", "I'm from ..."
    Location,
    /// "remember that ...", "don't forget ..."
    Instruction,
    /// "important: ...", "note: ..."
    Marked,
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryCategory::Identity => write!(f, "identity"),
            MemoryCategory::Preference => write!(f, "preference"),
            MemoryCategory::Occupation => write!(f, "occupation"),
            MemoryCategory::Location => write!(f, "location"),
            MemoryCategory::Instruction => write!(f, "instruction"),
            MemoryCategory::Marked => write!(f, "marked"),
        }
    }
}

impl FromStr for MemoryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "identity" => Ok(MemoryCategory::Identity),
            "preference" => Ok(MemoryCategory::Preference),
            "occupation" => Ok(MemoryCategory::Occupation),
            "location" => Ok(MemoryCategory::Location),
            "instruction" => Ok(MemoryCategory::Instruction),
            "marked" => Ok(MemoryCategory::Marked),
            other => Err(format!("invalid memory category: '{other}'")),
        }
    }
}

/// A single long-term fact about a user.
///
/// Records are user-scoped and never mutated after creation; they are
/// only appended or deleted. `score` is filled in on search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    pub user_id: String,
    #[serde(default)]
    pub metadata: MemoryMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// The category recorded at extraction time, if any.
    pub fn category(&self) -> Option<MemoryCategory> {
        self.metadata
            .get(CATEGORY_KEY)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }
}

/// Errors from memory backend operations.
///
/// Only remote backends produce these; the local heuristic store is
/// infallible and absorbs them through fallback.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("memory backend unreachable: {0}")]
    Unreachable(String),

    #[error("memory backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed memory backend response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_category_roundtrip() {
        for cat in [
            MemoryCategory::Identity,
            MemoryCategory::Preference,
            MemoryCategory::Occupation,
            MemoryCategory::Location,
            MemoryCategory::Instruction,
            MemoryCategory::Marked,
        ] {
            let s = cat.to_string();
            let parsed: MemoryCategory = s.parse().unwrap();
            assert_eq!(cat, parsed);
        }
    }

    #[test]
    fn test_record_category_from_metadata() {
        let now = Utc::now();
        let mut metadata = MemoryMetadata::new();
        metadata.insert(CATEGORY_KEY.to_string(), serde_json::json!("location"));
        let record = MemoryRecord {
            id: "m1".to_string(),
            content: "I live in Tokyo".to_string(),
            user_id: "u1".to_string(),
            metadata,
            score: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(record.category(), Some(MemoryCategory::Location));
    }

    #[test]
    fn test_record_deserialize_without_metadata() {
        let json = r#"{
            "id": "abc",
            "content": "User likes tea",
            "user_id": "u1",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;
        let record: MemoryRecord = serde_json::from_str(json).unwrap();
        assert!(record.metadata.is_empty());
        assert!(record.score.is_none());
        assert!(record.category().is_none());
    }

    #[test]
    fn test_memory_error_display() {
        let err = MemoryError::Status {
            status: 503,
            body: "down".to_string(),
        };
        assert_eq!(err.to_string(), "memory backend returned HTTP 503: down");
    }
}

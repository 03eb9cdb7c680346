//! In-process heuristic memory store.
//!
//! Records live in a per-user vector inside a concurrent map, in insertion
//! order. Extraction runs the importance heuristics from
//! [`extractor`](super::extractor); search scores records by the fraction of
//! query words they contain.

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use chorus_types::chat::{MessageRole, Turn};
use chorus_types::memory::{
    CATEGORY_KEY, MemoryError, MemoryMetadata, MemoryRecord, TURN_ID_KEY,
};

use super::backend::MemoryBackend;
use super::extractor;

/// Fraction of lowercase `query` words found as substrings of `content`.
///
/// Returns 0.0 for an empty query.
pub fn relevance(query_tokens: &[String], content: &str) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let content = content.to_lowercase();
    let hits = query_tokens
        .iter()
        .filter(|token| content.contains(token.as_str()))
        .count();
    hits as f32 / query_tokens.len() as f32
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn normalize(content: &str) -> String {
    content.trim().to_lowercase()
}

/// Per-user memory held in process.
#[derive(Debug, Default)]
pub struct LocalMemoryStore {
    memories: DashMap<String, Vec<MemoryRecord>>,
}

impl LocalMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the user turns that pass the importance heuristic.
    ///
    /// Each record's metadata is the caller's metadata plus the matched
    /// `category` and the source `turn_id`. Content already stored for the
    /// user (ignoring case and surrounding whitespace) is skipped.
    pub fn add_memory(
        &self,
        turns: &[Turn],
        user_id: &str,
        metadata: Option<&MemoryMetadata>,
    ) -> Vec<MemoryRecord> {
        let mut created = Vec::new();
        let mut records = self.memories.entry(user_id.to_string()).or_default();

        for turn in turns.iter().filter(|t| t.role == MessageRole::User) {
            let Some(category) = extractor::classify(&turn.content) else {
                continue;
            };

            let normalized = normalize(&turn.content);
            if records.iter().any(|r| normalize(&r.content) == normalized) {
                debug!(user_id, turn_id = %turn.id, "Memory already stored; skipping");
                continue;
            }

            let mut record_metadata = metadata.cloned().unwrap_or_default();
            record_metadata.insert(
                CATEGORY_KEY.to_string(),
                serde_json::Value::String(category.to_string()),
            );
            record_metadata.insert(
                TURN_ID_KEY.to_string(),
                serde_json::Value::String(turn.id.to_string()),
            );

            let now = Utc::now();
            let record = MemoryRecord {
                id: Uuid::now_v7().to_string(),
                content: turn.content.trim().to_string(),
                user_id: user_id.to_string(),
                metadata: record_metadata,
                score: None,
                created_at: now,
                updated_at: now,
            };
            records.push(record.clone());
            created.push(record);
        }

        if !created.is_empty() {
            debug!(user_id, count = created.len(), "Stored memories");
        }
        created
    }

    /// Records of `user_id` ranked by keyword relevance to `query`.
    ///
    /// Zero-relevance records are dropped; ties keep storage order. Each
    /// returned record carries its relevance in `score`.
    pub fn search_memory(&self, query: &str, user_id: &str, limit: usize) -> Vec<MemoryRecord> {
        let tokens = tokenize(query);
        let Some(records) = self.memories.get(user_id) else {
            return Vec::new();
        };

        let mut scored: Vec<MemoryRecord> = records
            .iter()
            .filter_map(|record| {
                let score = relevance(&tokens, &record.content);
                (score > 0.0).then(|| MemoryRecord {
                    score: Some(score),
                    ..record.clone()
                })
            })
            .collect();

        // sort_by is stable, so equal scores keep storage order.
        scored.sort_by(|a, b| {
            b.score
                .unwrap_or_default()
                .total_cmp(&a.score.unwrap_or_default())
        });
        scored.truncate(limit);
        scored
    }

    pub fn get_all_memories(&self, user_id: &str) -> Vec<MemoryRecord> {
        self.memories
            .get(user_id)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Remove the first record with `memory_id`, whichever user owns it.
    ///
    /// Returns whether a record was removed.
    pub fn delete_memory(&self, memory_id: &str) -> bool {
        for mut entry in self.memories.iter_mut() {
            if let Some(pos) = entry.iter().position(|r| r.id == memory_id) {
                entry.remove(pos);
                debug!(user_id = %entry.key(), memory_id, "Deleted memory");
                return true;
            }
        }
        false
    }
}

impl MemoryBackend for LocalMemoryStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn add_memory(
        &self,
        turns: &[Turn],
        user_id: &str,
        metadata: Option<&MemoryMetadata>,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(LocalMemoryStore::add_memory(self, turns, user_id, metadata))
    }

    async fn search_memory(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(LocalMemoryStore::search_memory(self, query, user_id, limit))
    }

    async fn get_all_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(LocalMemoryStore::get_all_memories(self, user_id))
    }

    async fn delete_memory(&self, memory_id: &str) -> Result<(), MemoryError> {
        LocalMemoryStore::delete_memory(self, memory_id);
        Ok(())
    }
}

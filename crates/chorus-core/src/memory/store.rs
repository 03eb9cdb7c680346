//! Remote-first semantic memory store.
//!
//! `SemanticMemoryStore` always owns a [`LocalMemoryStore`]. When a remote
//! backend is attached, every operation is tried there first; any failure
//! is logged and the same operation runs against the local store instead,
//! so callers never see a memory error.

use tracing::warn;

use chorus_types::chat::Turn;
use chorus_types::memory::{MemoryMetadata, MemoryRecord};

use super::box_backend::BoxMemoryBackend;
use super::local::LocalMemoryStore;

/// Long-term memory with optional remote backend and local fallback.
#[derive(Debug, Default)]
pub struct SemanticMemoryStore {
    local: LocalMemoryStore,
    remote: Option<BoxMemoryBackend>,
}

impl SemanticMemoryStore {
    /// Local-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that prefers `remote` and falls back to local memory.
    pub fn with_remote(remote: BoxMemoryBackend) -> Self {
        Self {
            local: LocalMemoryStore::new(),
            remote: Some(remote),
        }
    }

    pub fn local(&self) -> &LocalMemoryStore {
        &self.local
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    #[tracing::instrument(skip(self, turns, metadata), fields(turns = turns.len()))]
    pub async fn add_memory(
        &self,
        turns: &[Turn],
        user_id: &str,
        metadata: Option<&MemoryMetadata>,
    ) -> Vec<MemoryRecord> {
        if let Some(remote) = &self.remote {
            match remote.add_memory(turns, user_id, metadata).await {
                Ok(records) => return records,
                Err(e) => warn!(
                    backend = remote.name(),
                    error = %e,
                    "Remote add_memory failed, falling back to local store"
                ),
            }
        }
        self.local.add_memory(turns, user_id, metadata)
    }

    #[tracing::instrument(skip(self, query))]
    pub async fn search_memory(&self, query: &str, user_id: &str, limit: usize) -> Vec<MemoryRecord> {
        if let Some(remote) = &self.remote {
            match remote.search_memory(query, user_id, limit).await {
                Ok(records) => return records,
                Err(e) => warn!(
                    backend = remote.name(),
                    error = %e,
                    "Remote search_memory failed, falling back to local store"
                ),
            }
        }
        self.local.search_memory(query, user_id, limit)
    }

    pub async fn get_all_memories(&self, user_id: &str) -> Vec<MemoryRecord> {
        if let Some(remote) = &self.remote {
            match remote.get_all_memories(user_id).await {
                Ok(records) => return records,
                Err(e) => warn!(
                    backend = remote.name(),
                    error = %e,
                    "Remote get_all_memories failed, falling back to local store"
                ),
            }
        }
        self.local.get_all_memories(user_id)
    }

    pub async fn delete_memory(&self, memory_id: &str) {
        if let Some(remote) = &self.remote {
            match remote.delete_memory(memory_id).await {
                Ok(()) => return,
                Err(e) => warn!(
                    backend = remote.name(),
                    error = %e,
                    "Remote delete_memory failed, falling back to local store"
                ),
            }
        }
        self.local.delete_memory(memory_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeMemoryBackend, user_turn};

    #[tokio::test]
    async fn test_local_only_store_uses_heuristics() {
        let store = SemanticMemoryStore::new();
        assert!(!store.has_remote());

        let created = store.add_memory(&[user_turn("I live in Tokyo")], "u1", None).await;
        assert_eq!(created.len(), 1);
        assert_eq!(store.search_memory("tokyo", "u1", 5).await.len(), 1);

        store.delete_memory(&created[0].id).await;
        assert!(store.get_all_memories("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_healthy_remote_is_preferred() {
        let remote = FakeMemoryBackend::healthy();
        let calls = remote.calls();
        let store = SemanticMemoryStore::with_remote(BoxMemoryBackend::new(remote));

        let created = store.add_memory(&[user_turn("I live in Tokyo")], "u1", None).await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, "remote-1");

        let found = store.search_memory("tokyo", "u1", 5).await;
        assert_eq!(found[0].id, "remote-1");
        store.delete_memory("remote-1").await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["add".to_string(), "search".to_string(), "delete".to_string()]
        );
        // Nothing leaked into the local fallback.
        assert!(store.local().get_all_memories("u1").is_empty());
    }

    #[tokio::test]
    async fn test_failing_remote_falls_back_to_local() {
        let remote = FakeMemoryBackend::unreachable();
        let calls = remote.calls();
        let store = SemanticMemoryStore::with_remote(BoxMemoryBackend::new(remote));

        let created = store.add_memory(&[user_turn("my name is Alice")], "u1", None).await;
        assert_eq!(created.len(), 1);
        assert_eq!(store.local().get_all_memories("u1").len(), 1);

        let found = store.search_memory("alice", "u1", 5).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].score, Some(1.0));

        let all = store.get_all_memories("u1").await;
        assert_eq!(all.len(), 1);

        store.delete_memory(&all[0].id).await;
        assert!(store.local().get_all_memories("u1").is_empty());

        assert_eq!(calls.lock().unwrap().len(), 4);
    }
}

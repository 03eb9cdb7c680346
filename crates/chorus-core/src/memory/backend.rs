//! MemoryBackend trait definition.
//!
//! Remote services and the in-process heuristic store implement the same
//! interface, so a vector-similarity backend can be swapped in without
//! touching callers.

use chorus_types::chat::Turn;
use chorus_types::memory::{MemoryError, MemoryMetadata, MemoryRecord};

/// Trait for long-term memory backends.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// The HTTP implementation lives in chorus-infra.
pub trait MemoryBackend: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Extract and store memorable facts from `turns` for `user_id`.
    ///
    /// Returns the records that were created.
    fn add_memory(
        &self,
        turns: &[Turn],
        user_id: &str,
        metadata: Option<&MemoryMetadata>,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryRecord>, MemoryError>> + Send;

    /// Records of `user_id` relevant to `query`, best first, at most `limit`.
    fn search_memory(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryRecord>, MemoryError>> + Send;

    /// Every record of `user_id` in storage order.
    fn get_all_memories(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryRecord>, MemoryError>> + Send;

    /// Remove a record by id. Absent ids are not an error.
    fn delete_memory(
        &self,
        memory_id: &str,
    ) -> impl std::future::Future<Output = Result<(), MemoryError>> + Send;
}

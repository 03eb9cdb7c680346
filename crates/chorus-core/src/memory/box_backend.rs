//! BoxMemoryBackend -- object-safe dynamic dispatch wrapper for MemoryBackend.
//!
//! Follows the same blanket-impl pattern as BoxLlmProvider:
//! 1. Define an object-safe `MemoryBackendDyn` trait with boxed futures
//! 2. Blanket-impl `MemoryBackendDyn` for all `T: MemoryBackend`
//! 3. `BoxMemoryBackend` wraps `Box<dyn MemoryBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use chorus_types::chat::Turn;
use chorus_types::memory::{MemoryError, MemoryMetadata, MemoryRecord};

use super::backend::MemoryBackend;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, MemoryError>> + Send + 'a>>;

/// Object-safe version of [`MemoryBackend`] with boxed futures.
pub trait MemoryBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn add_memory_boxed<'a>(
        &'a self,
        turns: &'a [Turn],
        user_id: &'a str,
        metadata: Option<&'a MemoryMetadata>,
    ) -> BoxFuture<'a, Vec<MemoryRecord>>;

    fn search_memory_boxed<'a>(
        &'a self,
        query: &'a str,
        user_id: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Vec<MemoryRecord>>;

    fn get_all_memories_boxed<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Vec<MemoryRecord>>;

    fn delete_memory_boxed<'a>(&'a self, memory_id: &'a str) -> BoxFuture<'a, ()>;
}

/// Blanket implementation: any `MemoryBackend` automatically implements `MemoryBackendDyn`.
impl<T: MemoryBackend> MemoryBackendDyn for T {
    fn name(&self) -> &str {
        MemoryBackend::name(self)
    }

    fn add_memory_boxed<'a>(
        &'a self,
        turns: &'a [Turn],
        user_id: &'a str,
        metadata: Option<&'a MemoryMetadata>,
    ) -> BoxFuture<'a, Vec<MemoryRecord>> {
        Box::pin(self.add_memory(turns, user_id, metadata))
    }

    fn search_memory_boxed<'a>(
        &'a self,
        query: &'a str,
        user_id: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Vec<MemoryRecord>> {
        Box::pin(self.search_memory(query, user_id, limit))
    }

    fn get_all_memories_boxed<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Vec<MemoryRecord>> {
        Box::pin(self.get_all_memories(user_id))
    }

    fn delete_memory_boxed<'a>(&'a self, memory_id: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(self.delete_memory(memory_id))
    }
}

/// Type-erased memory backend for runtime selection.
///
/// Since `MemoryBackend` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxMemoryBackend` provides equivalent methods that delegate
/// to the inner `MemoryBackendDyn` trait object.
pub struct BoxMemoryBackend {
    inner: Box<dyn MemoryBackendDyn + Send + Sync>,
}

impl BoxMemoryBackend {
    /// Wrap a concrete `MemoryBackend` in a type-erased box.
    pub fn new<T: MemoryBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn add_memory(
        &self,
        turns: &[Turn],
        user_id: &str,
        metadata: Option<&MemoryMetadata>,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.inner.add_memory_boxed(turns, user_id, metadata).await
    }

    pub async fn search_memory(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.inner.search_memory_boxed(query, user_id, limit).await
    }

    pub async fn get_all_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.inner.get_all_memories_boxed(user_id).await
    }

    pub async fn delete_memory(&self, memory_id: &str) -> Result<(), MemoryError> {
        self.inner.delete_memory_boxed(memory_id).await
    }
}

impl std::fmt::Debug for BoxMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxMemoryBackend")
            .field("name", &self.name())
            .finish()
    }
}

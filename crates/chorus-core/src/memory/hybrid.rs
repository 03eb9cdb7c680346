//! Memory-augmented prompt context.
//!
//! `HybridMemoryManager` pairs the live conversation window with long-term
//! memory: it retrieves the records relevant to the current message, renders
//! them as a system-prompt fragment, and feeds the window back into memory
//! extraction. Every build both reads and writes memory.

use std::sync::Arc;

use tracing::debug;

use chorus_types::chat::Turn;
use chorus_types::memory::MemoryRecord;

use super::store::SemanticMemoryStore;

/// Records retrieved per context build unless configured otherwise.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

const PERSONALIZE_INSTRUCTION: &str =
    "You remember the following about this user. Use it to personalize your reply when relevant:";

/// Result of [`HybridMemoryManager::build_context`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryContext {
    /// Prompt fragment listing the relevant memories; empty when none matched.
    pub system_prompt: String,
    pub relevant_memories: Vec<MemoryRecord>,
}

/// Composes retrieved memories into prompt context.
#[derive(Debug, Clone)]
pub struct HybridMemoryManager {
    store: Arc<SemanticMemoryStore>,
    search_limit: usize,
}

impl HybridMemoryManager {
    pub fn new(store: Arc<SemanticMemoryStore>) -> Self {
        Self {
            store,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn store(&self) -> &Arc<SemanticMemoryStore> {
        &self.store
    }

    /// Retrieve memories relevant to `current_query`, then learn from `turns`.
    ///
    /// Search runs before extraction, so facts stated in the current window
    /// only surface on the next build.
    #[tracing::instrument(skip(self, turns, current_query), fields(turns = turns.len()))]
    pub async fn build_context(
        &self,
        turns: &[Turn],
        user_id: &str,
        current_query: &str,
    ) -> MemoryContext {
        let relevant_memories = self
            .store
            .search_memory(current_query, user_id, self.search_limit)
            .await;
        let system_prompt = render_memories(&relevant_memories);

        if !turns.is_empty() {
            self.store.add_memory(turns, user_id, None).await;
        }

        debug!(
            relevant = relevant_memories.len(),
            "Built memory context"
        );

        MemoryContext {
            system_prompt,
            relevant_memories,
        }
    }
}

/// Bullet list of memory contents under the personalize instruction.
pub fn render_memories(memories: &[MemoryRecord]) -> String {
    if memories.is_empty() {
        return String::new();
    }
    let mut fragment = String::from(PERSONALIZE_INSTRUCTION);
    for memory in memories {
        fragment.push_str("\n- ");
        fragment.push_str(&memory.content);
    }
    fragment
}

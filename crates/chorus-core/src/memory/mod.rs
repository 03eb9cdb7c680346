//! Long-term memory for Chorus.
//!
//! - `MemoryBackend`: the four-operation port every backend implements
//! - `LocalMemoryStore`: in-process heuristic extraction and keyword relevance
//! - `SemanticMemoryStore`: remote-first store that falls back to the local one
//! - `HybridMemoryManager`: turns retrieved memories into a prompt fragment

pub mod backend;
pub mod box_backend;
pub mod extractor;
pub mod hybrid;
pub mod local;
pub mod store;

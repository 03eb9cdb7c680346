//! Per-session conversation state for Chorus.
//!
//! - `SessionContextStore`: sliding window of turns per session, with
//!   threshold-triggered compaction into summaries
//! - `Summarizer`: turns a compacted prefix into summary text

pub mod store;
pub mod summarizer;

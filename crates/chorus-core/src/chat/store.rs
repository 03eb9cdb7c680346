//! Sliding window context store.
//!
//! `SessionContextStore` keeps, per session id, the most recent turns (the
//! live window) plus the summaries that replaced older turns. Every append
//! checks the compaction threshold first and trims the window second, so
//! the window never exceeds `short_term_window` when `add_message` returns.

use std::collections::VecDeque;

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use chorus_types::chat::{ContextStats, MessageRole, NewTurn, Session, Summary, Turn};
use chorus_types::config::ContextConfig;

use super::summarizer::{HeuristicSummarizer, Summarizer};

/// Windows shorter than this are never compacted, whatever the threshold.
pub const MIN_COMPACTION_TURNS: usize = 10;

/// Header of the synthetic system turn that carries stored summaries.
pub const SUMMARY_HEADER: &str = "Summary of the earlier conversation:";

/// Mutable state for one session.
#[derive(Debug)]
struct SessionState {
    session: Session,
    window: VecDeque<Turn>,
    summaries: Vec<Summary>,
}

impl SessionState {
    fn new(session_id: &str) -> Self {
        Self {
            session: Session::from_id(session_id, Utc::now()),
            window: VecDeque::new(),
            summaries: Vec::new(),
        }
    }
}

/// In-memory per-session turn windows with compaction.
///
/// Each map entry is locked for the duration of a single operation, so
/// individual calls are atomic. Callers that need a consistent view across
/// several calls (append, generate, append) serialize per session above
/// this layer.
pub struct SessionContextStore {
    config: ContextConfig,
    summarizer: Box<dyn Summarizer>,
    sessions: DashMap<String, SessionState>,
}

impl SessionContextStore {
    /// Create a store using the heuristic summarizer.
    pub fn new(config: ContextConfig) -> Self {
        Self::with_summarizer(config, HeuristicSummarizer)
    }

    /// Create a store with a custom summarizer for compaction.
    pub fn with_summarizer(config: ContextConfig, summarizer: impl Summarizer + 'static) -> Self {
        Self {
            config,
            summarizer: Box::new(summarizer),
            sessions: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Append a turn to a session, compacting and trimming as needed.
    ///
    /// Creates the session on first use. Compaction runs when the window
    /// has reached `compress_threshold` (and holds at least
    /// [`MIN_COMPACTION_TURNS`]); trimming then evicts the oldest turns
    /// until the window fits `short_term_window`.
    pub fn add_message(&self, session_id: &str, turn: NewTurn) -> Turn {
        let now = Utc::now();
        let turn = Turn {
            id: Uuid::now_v7(),
            session_id: session_id.to_string(),
            role: turn.role,
            content: turn.content,
            timestamp: now,
            agent_id: turn.agent_id,
        };

        let mut state = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(session_id));
        state.session.last_active_at = now;
        state.window.push_back(turn.clone());

        if state.window.len() >= self.config.compress_threshold {
            self.compact(&mut state);
        }

        while state.window.len() > self.config.short_term_window {
            state.window.pop_front();
        }

        turn
    }

    /// Halve the window: the older half becomes one summary.
    fn compact(&self, state: &mut SessionState) {
        let len = state.window.len();
        if len < MIN_COMPACTION_TURNS {
            debug!(
                session_id = %state.session.id,
                window = len,
                "Compaction threshold reached but window too small; skipping"
            );
            return;
        }

        let split = len / 2;
        let older: Vec<Turn> = state.window.drain(..split).collect();
        let summary = Summary {
            id: Uuid::now_v7(),
            session_id: state.session.id.clone(),
            content: self.summarizer.summarize(&older),
            turn_count: older.len(),
            created_at: Utc::now(),
        };
        state.summaries.push(summary);

        debug!(
            session_id = %state.session.id,
            compacted = older.len(),
            remaining = state.window.len(),
            summaries = state.summaries.len(),
            "Compacted session window"
        );
    }

    /// The prompt-ready history for a session.
    ///
    /// When summaries exist, a single synthetic system turn holding all of
    /// them (oldest first) precedes the live window. Unknown sessions yield
    /// an empty vector.
    pub fn get_context(&self, session_id: &str) -> Vec<Turn> {
        let Some(state) = self.sessions.get(session_id) else {
            return Vec::new();
        };

        let mut context = Vec::with_capacity(state.window.len() + 1);

        if let Some(last) = state.summaries.last() {
            let joined: Vec<&str> = state.summaries.iter().map(|s| s.content.as_str()).collect();
            context.push(Turn {
                id: Uuid::now_v7(),
                session_id: session_id.to_string(),
                role: MessageRole::System,
                content: format!("{SUMMARY_HEADER}\n{}", joined.join("\n")),
                timestamp: last.created_at,
                agent_id: None,
            });
        }

        context.extend(state.window.iter().cloned());
        context
    }

    /// Drop a session's window and summaries. Idempotent.
    pub fn clear_context(&self, session_id: &str) {
        if self.sessions.remove(session_id).is_some() {
            debug!(session_id, "Cleared session context");
        }
    }

    /// Live window size and summary count for a session.
    pub fn get_stats(&self, session_id: &str) -> ContextStats {
        self.sessions
            .get(session_id)
            .map(|state| ContextStats {
                message_count: state.window.len(),
                summary_count: state.summaries.len(),
            })
            .unwrap_or_default()
    }

    /// Session metadata, if the session has seen any message.
    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.session.clone())
    }

    /// Stored summaries for a session, oldest first.
    pub fn get_summaries(&self, session_id: &str) -> Vec<Summary> {
        self.sessions
            .get(session_id)
            .map(|s| s.summaries.clone())
            .unwrap_or_default()
    }

    /// Ids of every known session.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}

impl std::fmt::Debug for SessionContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContextStore")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(window: usize, threshold: usize) -> SessionContextStore {
        SessionContextStore::new(ContextConfig {
            short_term_window: window,
            compress_threshold: threshold,
        })
    }

    fn fill(store: &SessionContextStore, session: &str, n: usize) {
        for i in 0..n {
            store.add_message(session, NewTurn::user(format!("message {i}")));
        }
    }

    #[test]
    fn test_add_message_assigns_id_and_timestamp() {
        let store = store(5, 100);
        let before = Utc::now();
        let a = store.add_message("cli:u1", NewTurn::user("hello"));
        let b = store.add_message("cli:u1", NewTurn::assistant("hi", "helper"));

        assert_ne!(a.id, b.id);
        assert!(a.timestamp >= before);
        assert_eq!(a.session_id, "cli:u1");
        assert_eq!(b.agent_id.as_deref(), Some("helper"));
        assert_eq!(b.role, MessageRole::Assistant);
    }

    #[test]
    fn test_window_is_trimmed_without_compaction() {
        let store = store(5, 100);
        fill(&store, "s", 12);

        let stats = store.get_stats("s");
        assert_eq!(stats.message_count, 5);
        assert_eq!(stats.summary_count, 0);

        let context = store.get_context("s");
        assert_eq!(context.first().unwrap().content, "message 7");
        assert_eq!(context.last().unwrap().content, "message 11");
    }

    #[test]
    fn test_compaction_halves_window_at_threshold() {
        let store = store(20, 12);
        fill(&store, "s", 11);
        assert_eq!(store.get_stats("s").summary_count, 0);
        assert_eq!(store.get_stats("s").message_count, 11);

        store.add_message("s", NewTurn::user("message 11"));
        let stats = store.get_stats("s");
        assert_eq!(stats.summary_count, 1);
        assert_eq!(stats.message_count, 6);

        let summaries = store.get_summaries("s");
        assert_eq!(summaries[0].turn_count, 6);
        assert!(summaries[0].content.contains("6 turns"));

        let context = store.get_context("s");
        assert_eq!(context[1].content, "message 6");
    }

    #[test]
    fn test_compaction_happens_before_trim() {
        // The window can only reach the threshold when it is at most one past the limit.
        let store = store(10, 11);
        fill(&store, "s", 11);

        let stats = store.get_stats("s");
        assert_eq!(stats.summary_count, 1);
        // 11 turns halved at floor(11 / 2) = 5 keeps 6, already under the limit.
        assert_eq!(stats.message_count, 6);
    }

    #[test]
    fn test_compaction_skipped_below_minimum_but_window_still_trimmed() {
        let store = store(4, 3);
        fill(&store, "s", 9);

        let stats = store.get_stats("s");
        assert_eq!(stats.summary_count, 0);
        assert_eq!(stats.message_count, 4);
    }

    #[test]
    fn test_window_never_exceeds_limit() {
        let store = store(7, 8);
        for i in 0..50 {
            store.add_message("s", NewTurn::user(format!("m{i}")));
            assert!(store.get_stats("s").message_count <= 7);
        }
    }

    #[test]
    fn test_get_context_prepends_summary_turn() {
        let store = store(20, 10);
        fill(&store, "s", 10);
        fill(&store, "s", 1);

        let context = store.get_context("s");
        let first = &context[0];
        assert_eq!(first.role, MessageRole::System);
        assert!(first.content.starts_with(SUMMARY_HEADER));
        assert!(first.agent_id.is_none());
        assert_eq!(context.len(), 1 + store.get_stats("s").message_count);

        let live: Vec<&str> = context[1..].iter().map(|t| t.content.as_str()).collect();
        assert_eq!(live, vec!["message 5", "message 6", "message 7", "message 8", "message 9", "message 0"]);
    }

    #[test]
    fn test_get_context_joins_summaries_in_creation_order() {
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let store = SessionContextStore::with_summarizer(
            ContextConfig {
                short_term_window: 20,
                compress_threshold: 10,
            },
            move |_turns: &[Turn]| {
                let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                format!("summary #{n}")
            },
        );
        fill(&store, "s", 10);
        fill(&store, "s", 5);

        assert_eq!(store.get_stats("s").summary_count, 2);
        let context = store.get_context("s");
        assert_eq!(context[0].content, format!("{SUMMARY_HEADER}\nsummary #0\nsummary #1"));
    }

    #[test]
    fn test_unknown_session_is_empty() {
        let store = store(5, 10);
        assert!(store.get_context("nobody").is_empty());
        assert_eq!(store.get_stats("nobody"), ContextStats::default());
        assert!(store.get_session("nobody").is_none());
    }

    #[test]
    fn test_clear_context_is_idempotent() {
        let store = store(20, 10);
        fill(&store, "s", 15);
        assert!(store.get_stats("s").summary_count > 0);

        store.clear_context("s");
        assert_eq!(store.get_stats("s"), ContextStats::default());
        store.clear_context("s");
        assert_eq!(store.get_stats("s"), ContextStats::default());
        assert!(store.get_context("s").is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = store(5, 100);
        fill(&store, "a", 3);
        fill(&store, "b", 1);
        assert_eq!(store.get_stats("a").message_count, 3);
        assert_eq!(store.get_stats("b").message_count, 1);

        let mut ids = store.session_ids();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_session_metadata_tracks_activity() {
        let store = store(5, 100);
        store.add_message("telegram:grp:u9", NewTurn::user("hi"));
        let first = store.get_session("telegram:grp:u9").unwrap();
        assert_eq!(first.platform, "telegram");
        assert_eq!(first.group_id.as_deref(), Some("grp"));
        assert_eq!(first.user_id, "u9");

        store.add_message("telegram:grp:u9", NewTurn::user("again"));
        let second = store.get_session("telegram:grp:u9").unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_active_at >= first.last_active_at);
    }
}

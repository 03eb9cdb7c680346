//! Compaction summarizers.
//!
//! When a session's live window is compacted, its older half is condensed
//! into one summary by a `Summarizer`. The default `HeuristicSummarizer`
//! records turn counts and a few representative topics without calling an
//! LLM, which keeps `add_message` synchronous and infallible.

use chorus_types::chat::{MessageRole, Turn};

/// Maximum number of user turns quoted as topics.
const MAX_TOPICS: usize = 3;

/// Words kept from each quoted user turn.
const TOPIC_WORDS: usize = 8;

/// Condenses a contiguous run of turns into summary text.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, turns: &[Turn]) -> String;
}

/// Counts-and-topics summarizer used unless another one is injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicSummarizer;

impl HeuristicSummarizer {
    /// Leading words of the first few user turns.
    fn topics(turns: &[Turn]) -> Vec<String> {
        turns
            .iter()
            .filter(|t| t.role == MessageRole::User)
            .filter_map(|t| {
                let words: Vec<&str> = t.content.split_whitespace().collect();
                if words.is_empty() {
                    return None;
                }
                let mut topic = words[..words.len().min(TOPIC_WORDS)].join(" ");
                if words.len() > TOPIC_WORDS {
                    topic.push_str("...");
                }
                Some(topic)
            })
            .take(MAX_TOPICS)
            .collect()
    }
}

impl Summarizer for HeuristicSummarizer {
    fn summarize(&self, turns: &[Turn]) -> String {
        let user = turns.iter().filter(|t| t.role == MessageRole::User).count();
        let assistant = turns
            .iter()
            .filter(|t| t.role == MessageRole::Assistant)
            .count();

        let mut summary = format!(
            "Earlier conversation of {} turns ({user} from the user, {assistant} from assistants).",
            turns.len()
        );

        let topics = Self::topics(turns);
        if !topics.is_empty() {
            summary.push_str(" Topics: ");
            summary.push_str(&topics.join("; "));
        }

        summary
    }
}

impl<F> Summarizer for F
where
    F: Fn(&[Turn]) -> String + Send + Sync,
{
    fn summarize(&self, turns: &[Turn]) -> String {
        self(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn turn(role: MessageRole, content: &str) -> Turn {
        Turn {
            id: Uuid::now_v7(),
            session_id: "test:1".to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            agent_id: None,
        }
    }

    #[test]
    fn test_counts_roles() {
        let turns = vec![
            turn(MessageRole::User, "hi"),
            turn(MessageRole::Assistant, "hello"),
            turn(MessageRole::User, "how are you"),
        ];
        let summary = HeuristicSummarizer.summarize(&turns);
        assert!(summary.starts_with("Earlier conversation of 3 turns (2 from the user, 1 from assistants)."));
    }

    #[test]
    fn test_topics_are_truncated_and_limited() {
        let turns = vec![
            turn(MessageRole::User, "one two three four five six seven eight nine ten"),
            turn(MessageRole::Assistant, "ignored reply"),
            turn(MessageRole::User, "second topic"),
            turn(MessageRole::User, "   "),
            turn(MessageRole::User, "third topic"),
            turn(MessageRole::User, "fourth topic"),
        ];
        let summary = HeuristicSummarizer.summarize(&turns);
        assert!(summary.contains("Topics: one two three four five six seven eight...; second topic; third topic"));
        assert!(!summary.contains("fourth topic"));
        assert!(!summary.contains("ignored reply"));
    }

    #[test]
    fn test_no_user_turns_has_no_topics() {
        let turns = vec![turn(MessageRole::Assistant, "monologue")];
        let summary = HeuristicSummarizer.summarize(&turns);
        assert!(!summary.contains("Topics"));
    }

    #[test]
    fn test_closure_summarizer() {
        let summarizer = |turns: &[Turn]| format!("{} turns", turns.len());
        assert_eq!(summarizer.summarize(&[turn(MessageRole::User, "x")]), "1 turns");
    }
}

//! Scripted collaborators shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use chorus_types::chat::{MessageRole, Turn};
use chorus_types::llm::{
    CompletionRequest, CompletionResponse, LlmConfig, LlmError, StopReason, Usage,
};
use chorus_types::memory::{MemoryError, MemoryMetadata, MemoryRecord};

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::provider::LlmProvider;
use crate::memory::backend::MemoryBackend;

/// Provider that replays canned replies in order and records every request.
///
/// Once the script runs out, every further call fails with a provider error.
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(name: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script mixing successes (`Ok`) and failures (`Err(message)`).
    pub fn with_script(name: &str, script: Vec<Result<&str, &str>>) -> Self {
        Self {
            name: name.to_string(),
            replies: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self::with_script("failing", vec![Err(message)])
    }

    /// Shared handle to the recorded requests.
    pub fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(CompletionResponse {
                id: format!("resp-{}", self.requests.lock().unwrap().len()),
                content,
                model: "scripted-model".to_string(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
            Some(Err(message)) => Err(LlmError::Provider { message }),
            None => Err(LlmError::Provider {
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// Factory that names each provider after the config's `name` and never
/// produces replies. Enough for registry bookkeeping tests.
pub fn silent_factory(config: &LlmConfig) -> Result<BoxLlmProvider, LlmError> {
    Ok(BoxLlmProvider::new(ScriptedProvider::new(
        &config.name,
        Vec::<String>::new(),
    )))
}

/// A user turn with a fresh id, for feeding memory and selection code.
pub fn user_turn(content: &str) -> Turn {
    turn(MessageRole::User, content, None)
}

/// An assistant turn attributed to `agent_id`.
pub fn agent_turn(content: &str, agent_id: &str) -> Turn {
    turn(MessageRole::Assistant, content, Some(agent_id))
}

fn turn(role: MessageRole, content: &str, agent_id: Option<&str>) -> Turn {
    Turn {
        id: Uuid::now_v7(),
        session_id: "test:u1".to_string(),
        role,
        content: content.to_string(),
        timestamp: Utc::now(),
        agent_id: agent_id.map(str::to_string),
    }
}

/// Memory backend that either answers with one canned record or always
/// fails as unreachable. Records the name of every operation it receives.
pub struct FakeMemoryBackend {
    healthy: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeMemoryBackend {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            healthy: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn answer<T>(&self, op: &str, value: T) -> Result<T, MemoryError> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.healthy {
            Ok(value)
        } else {
            Err(MemoryError::Unreachable("connection refused".to_string()))
        }
    }

    fn record(user_id: &str, content: &str) -> MemoryRecord {
        let now = Utc::now();
        MemoryRecord {
            id: "remote-1".to_string(),
            content: content.to_string(),
            user_id: user_id.to_string(),
            metadata: MemoryMetadata::new(),
            score: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl MemoryBackend for FakeMemoryBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn add_memory(
        &self,
        turns: &[Turn],
        user_id: &str,
        _metadata: Option<&MemoryMetadata>,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = turns
            .first()
            .map(|t| vec![Self::record(user_id, &t.content)])
            .unwrap_or_default();
        self.answer("add", records)
    }

    async fn search_memory(
        &self,
        query: &str,
        user_id: &str,
        _limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let mut record = Self::record(user_id, query);
        record.score = Some(1.0);
        self.answer("search", vec![record])
    }

    async fn get_all_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.answer("get_all", vec![Self::record(user_id, "remote fact")])
    }

    async fn delete_memory(&self, _memory_id: &str) -> Result<(), MemoryError> {
        self.answer("delete", ())
    }
}

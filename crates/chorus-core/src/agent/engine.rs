//! Conversation engine for Chorus.
//!
//! `ConversationEngine` wires the stores, the persona registry and the chain
//! controller into the per-message flow:
//!
//! 1. append the user turn (which may compact the window)
//! 2. select a persona from the message and the resulting context
//! 3. build memory context, call the persona's provider, append the answer
//! 4. while the chain controller hands off: pause, then repeat step 3 for
//!    the next persona
//!
//! Messages for the same session are serialized by a per-session async
//! mutex; different sessions run concurrently.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use chorus_types::agent::Agent;
use chorus_types::chat::{MessageRole, NewTurn, Session, SessionKey, Turn};
use chorus_types::error::RegistryError;
use chorus_types::llm::{LlmError, Message};

use crate::chat::store::SessionContextStore;
use crate::memory::hybrid::HybridMemoryManager;

use super::chain::{ChainController, ChainState};
use super::registry::AgentRegistry;

/// Errors surfaced by [`ConversationEngine::handle_message`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("empty message")]
    EmptyMessage,
}

/// A message arriving from a chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub session_id: String,
    pub user_id: String,
    pub content: String,
}

impl IncomingMessage {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            content: content.into(),
        }
    }

    /// Message whose session id is derived from a [`SessionKey`].
    pub fn from_key(key: &SessionKey, content: impl Into<String>) -> Self {
        Self::new(key.to_string(), key.user_id.clone(), content)
    }
}

/// One persona answer produced while handling a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub agent_id: String,
    pub agent_name: String,
    pub content: String,
    /// 0 for the direct answer, then 1, 2, ... for chained follow-ups.
    pub depth: u32,
}

/// Per-message orchestration over shared stores.
pub struct ConversationEngine {
    context: Arc<SessionContextStore>,
    memory: HybridMemoryManager,
    registry: Arc<AgentRegistry>,
    chain: ChainController,
    session_locks: DashMap<String, Arc<Mutex<()>>>,
    cancel: CancellationToken,
}

impl ConversationEngine {
    pub fn new(
        context: Arc<SessionContextStore>,
        memory: HybridMemoryManager,
        registry: Arc<AgentRegistry>,
    ) -> Self {
        let chain = ChainController::new(Arc::clone(&registry));
        Self::with_chain(context, memory, registry, chain)
    }

    /// Engine with a custom chain controller (e.g. a deterministic roll).
    pub fn with_chain(
        context: Arc<SessionContextStore>,
        memory: HybridMemoryManager,
        registry: Arc<AgentRegistry>,
        chain: ChainController,
    ) -> Self {
        Self {
            context,
            memory,
            registry,
            chain,
            session_locks: DashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn context(&self) -> &Arc<SessionContextStore> {
        &self.context
    }

    pub fn memory(&self) -> &HybridMemoryManager {
        &self.memory
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.context.get_session(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.context.session_ids()
    }

    /// Token that, once cancelled, cuts every pending chain delay short.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop pending and future chains. Direct answers still run.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Drop a session's window, summaries and lock.
    ///
    /// Waits for any message in flight for the session to finish first.
    pub async fn clear_session(&self, session_id: &str) {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;
        self.context.clear_context(session_id);
        self.session_locks.remove(session_id);
        debug!(session_id, "Cleared session");
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(&self.session_locks.entry(session_id.to_string()).or_default())
    }

    /// Answer `message`, following up with chained personas when allowed.
    ///
    /// A failure of the direct answer is returned; a failure during a
    /// chained hop ends the chain and keeps the replies gathered so far.
    #[tracing::instrument(skip(self, message), fields(session_id = %message.session_id, user_id = %message.user_id))]
    pub async fn handle_message(&self, message: IncomingMessage) -> Result<Vec<AgentReply>, EngineError> {
        if message.content.trim().is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let lock = self.session_lock(&message.session_id);
        let _guard = lock.lock().await;

        self.context
            .add_message(&message.session_id, NewTurn::user(message.content.clone()));

        let history = self.context.get_context(&message.session_id);
        let agent = self.registry.select_agent(&message.content, &history)?;
        info!(agent_id = %agent.id, "Selected agent");

        let first = self
            .respond(&agent, &message.session_id, &message.user_id, &message.content, 0)
            .await?;

        let mut replies = vec![first];
        let mut state = ChainState::new();
        let delay = Duration::from_millis(self.registry.group_chat().chain_delay_ms);

        loop {
            let Some(last) = replies.last() else {
                break;
            };
            let Some(next) = self.chain.next_hop(&mut state, &last.agent_id, &last.content) else {
                break;
            };
            let query = last.content.clone();

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Chain cancelled during delay");
                    state.terminate();
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match self
                .respond(&next, &message.session_id, &message.user_id, &query, state.depth())
                .await
            {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    warn!(agent_id = %next.id, depth = state.depth(), error = %e, "Chained response failed; ending chain");
                    state.terminate();
                    break;
                }
            }
        }

        info!(replies = replies.len(), depth = state.depth(), "Handled message");
        Ok(replies)
    }

    /// One persona answer: memory context, LLM call, answer appended.
    async fn respond(
        &self,
        agent: &Agent,
        session_id: &str,
        user_id: &str,
        query: &str,
        depth: u32,
    ) -> Result<AgentReply, EngineError> {
        let history = self.context.get_context(session_id);
        let memory = self.memory.build_context(&history, user_id, query).await;

        // Summary turns join the system prompt; providers only take user
        // and assistant messages.
        let mut sections = vec![self.registry.build_multi_agent_system_prompt(agent, true)];
        sections.extend(
            history
                .iter()
                .filter(|t| t.role == MessageRole::System)
                .map(|t| t.content.clone()),
        );
        if !memory.system_prompt.is_empty() {
            sections.push(memory.system_prompt);
        }
        let system_prompt = sections.join("\n\n");

        let messages = render_history(&self.registry, agent, &history);

        let provider = self.registry.get_llm_provider(&agent.id);
        let options = self
            .registry
            .llm_config(agent)
            .chat_options(Some(system_prompt));

        let span = info_span!("chorus.respond", agent_id = %agent.id, depth);
        let content = provider.chat(&messages, &options).instrument(span).await?;

        self.context
            .add_message(session_id, NewTurn::assistant(content.clone(), agent.id.clone()));

        Ok(AgentReply {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            content,
            depth,
        })
    }
}

/// Provider messages for `agent` from the session context.
///
/// Summary turns are skipped. Answers from other personas become user
/// messages attributed as `[Name]: ...`, so a request never ends with
/// another persona's answer in the assistant role.
fn render_history(registry: &AgentRegistry, agent: &Agent, history: &[Turn]) -> Vec<Message> {
    history
        .iter()
        .filter(|t| t.role != MessageRole::System)
        .map(|t| match (t.role, t.agent_id.as_deref()) {
            (MessageRole::Assistant, Some(author)) if author != agent.id => {
                let name = registry
                    .get(author)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| author.to_string());
                Message {
                    role: MessageRole::User,
                    content: format!("[{name}]: {}", t.content),
                }
            }
            _ => t.to_message(),
        })
        .collect()
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("registry", &self.registry)
            .field("sessions", &self.session_locks.len())
            .finish()
    }
}

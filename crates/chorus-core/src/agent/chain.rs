//! Persona-to-persona chaining.
//!
//! After a persona answers, `ChainController` decides whether another
//! persona should follow up. A chain for one incoming message is an
//! explicit state machine: `ChainState` starts at depth 0 and either
//! advances one hop per positive decision or becomes terminal. Depth can
//! never exceed `max_agent_chain`, whatever the draws or the text.

use std::sync::Arc;

use tracing::debug;

use chorus_types::agent::Agent;

use super::registry::AgentRegistry;

/// Source of uniform draws in `[0, 1)` for chain decisions.
pub trait ChainRoll: Send + Sync {
    fn roll(&self) -> f64;
}

/// Draws from the thread-local `rand` generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandRoll;

impl ChainRoll for RandRoll {
    fn roll(&self) -> f64 {
        rand::random::<f64>()
    }
}

impl<F> ChainRoll for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn roll(&self) -> f64 {
        self()
    }
}

/// Outcome of [`ChainController::should_chain_agent`].
#[derive(Debug, Clone)]
pub struct ChainDecision {
    pub should_chain: bool,
    pub next_agent: Option<Arc<Agent>>,
}

impl ChainDecision {
    fn stop() -> Self {
        Self {
            should_chain: false,
            next_agent: None,
        }
    }

    fn to(agent: Arc<Agent>) -> Self {
        Self {
            should_chain: true,
            next_agent: Some(agent),
        }
    }
}

/// Progress of one chain. Depth 0 is the first answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainState {
    depth: u32,
    terminal: bool,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// End the chain; no further hops will be produced.
    pub fn terminate(&mut self) {
        self.terminal = true;
    }
}

/// Decides whether a persona's answer hands off to another persona.
pub struct ChainController {
    registry: Arc<AgentRegistry>,
    roll: Box<dyn ChainRoll>,
}

impl ChainController {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self::with_roll(registry, RandRoll)
    }

    /// Controller with an injected random source.
    pub fn with_roll(registry: Arc<AgentRegistry>, roll: impl ChainRoll + 'static) -> Self {
        Self {
            registry,
            roll: Box::new(roll),
        }
    }

    /// Whether the answer `response_text` from `last_agent_id`, given at
    /// `depth`, should be followed by another persona.
    ///
    /// Other personas are tried in registration order. A persona qualifies
    /// when the response mentions `@name`, `name` or one of its triggers
    /// (case-insensitive) and an independent draw falls below
    /// `chain_threshold`. The first qualifying persona wins.
    pub fn should_chain_agent(&self, last_agent_id: &str, response_text: &str, depth: u32) -> ChainDecision {
        let config = self.registry.group_chat();
        if !config.enabled || !config.agent_interaction || depth >= config.max_agent_chain {
            return ChainDecision::stop();
        }

        let lowered = response_text.to_lowercase();

        for agent in self.registry.agents().iter().filter(|a| a.id != last_agent_id) {
            if !mentions(&lowered, agent) {
                continue;
            }
            let draw = self.roll.roll();
            if draw < config.chain_threshold {
                debug!(
                    from = last_agent_id,
                    to = %agent.id,
                    depth,
                    draw,
                    "Chaining to next agent"
                );
                return ChainDecision::to(Arc::clone(agent));
            }
            debug!(candidate = %agent.id, draw, "Chain candidate lost the draw");
        }

        ChainDecision::stop()
    }

    /// Advance `state` after `last_agent_id` answered with `response_text`.
    ///
    /// Returns the next persona and bumps the depth, or marks the state
    /// terminal and returns `None`. A terminal state stays terminal.
    pub fn next_hop(
        &self,
        state: &mut ChainState,
        last_agent_id: &str,
        response_text: &str,
    ) -> Option<Arc<Agent>> {
        if state.terminal {
            return None;
        }
        match self.should_chain_agent(last_agent_id, response_text, state.depth) {
            ChainDecision {
                should_chain: true,
                next_agent: Some(agent),
            } => {
                state.depth += 1;
                Some(agent)
            }
            _ => {
                state.terminal = true;
                None
            }
        }
    }
}

impl std::fmt::Debug for ChainController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainController")
            .field("group_chat", self.registry.group_chat())
            .finish()
    }
}

/// Whether `lowered` names `agent` by `@name`, `name` or a trigger.
fn mentions(lowered: &str, agent: &Agent) -> bool {
    let name = agent.name.to_lowercase();
    let at_name = format!("@{name}");
    std::iter::once(at_name.as_str())
        .chain(std::iter::once(name.as_str()))
        .map(str::to_string)
        .chain(agent.triggers.iter().map(|t| t.to_lowercase()))
        .filter(|p| !p.is_empty() && p != "@")
        .any(|p| lowered.contains(&p))
}

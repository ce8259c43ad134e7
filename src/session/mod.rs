//! Chat session context.
//!
//! [`ChatSession`] bundles one [`AgentSession`], one [`HistoryStore`] and one
//! [`InvocationBridge`] so a front-end has a single object to drive. Nothing is
//! global: two sessions never share a handle or a history unless they are
//! built over the same backend.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::action::{SideEffect, SideEffectAction};
use crate::agent::{AgentFactory, AgentSession, SessionState};
use crate::bridge::InvocationBridge;
use crate::config::{ApiKey, Credentials, ParleyConfig};
use crate::error::ParleyError;
use crate::history::HistoryStore;
use crate::models::ModelId;
use crate::types::Turn;

/// Everything one conversation needs, explicitly constructed.
pub struct ChatSession {
    agent: AgentSession,
    history: HistoryStore,
    bridge: InvocationBridge,
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("agent", &self.agent)
            .field("history", &self.history)
            .field("bridge", &self.bridge)
            .finish()
    }
}

impl ChatSession {
    pub fn new(
        factory: Arc<dyn AgentFactory>,
        history: HistoryStore,
        bridge: InvocationBridge,
    ) -> Self {
        Self {
            agent: AgentSession::new(factory),
            history,
            bridge,
        }
    }

    /// Build a session over the OpenAI agent, persisting history to
    /// `config.history_path` when set and to memory otherwise.
    ///
    /// The session starts `Uninitialized` even if the config carries a key.
    #[cfg(feature = "openai")]
    pub fn from_config(config: &ParleyConfig) -> Self {
        use crate::agent::{AgentOptions, OpenAiAgentFactory};

        let factory = OpenAiAgentFactory::new(AgentOptions::from_config(config));
        let history = match config.history_path {
            Some(ref path) => HistoryStore::jsonl(path),
            None => HistoryStore::in_memory(),
        };
        let bridge = match config.request_timeout {
            Some(timeout) => InvocationBridge::new().with_timeout(timeout),
            None => InvocationBridge::new(),
        };
        Self::new(Arc::new(factory), history, bridge)
    }

    pub fn initialize(&self, credentials: Credentials) -> Result<SessionState, ParleyError> {
        self.agent.initialize(credentials)
    }

    pub fn initialize_with(
        &self,
        api_key: impl Into<ApiKey>,
        model_id: &str,
    ) -> Result<SessionState, ParleyError> {
        self.agent.initialize_with(api_key, model_id)
    }

    /// Initialize from the credentials a config carries.
    pub fn initialize_from(&self, config: &ParleyConfig) -> Result<SessionState, ParleyError> {
        match config.credentials() {
            Ok(credentials) => self.initialize(credentials),
            Err(err) => {
                self.agent.reset();
                Err(err)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.agent.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.agent.watch_state()
    }

    pub fn model(&self) -> Option<ModelId> {
        self.agent.model()
    }

    pub fn key_fingerprint(&self) -> Option<String> {
        self.agent.key_fingerprint()
    }

    /// Send one message and return the reply.
    ///
    /// History gains the user turn and the reply only when the remote call
    /// succeeds; on any failure it is left exactly as it was.
    pub fn send(&self, message: &str) -> Result<String, ParleyError> {
        let handle = self.agent.current()?;
        let reply = self.bridge.invoke(&handle, message)?;
        self.history.append_exchange(message, reply.as_str())?;
        debug!(generation = handle.generation(), "Exchange recorded");
        Ok(reply)
    }

    pub fn load_history(&self) -> Result<Vec<Turn>, ParleyError> {
        self.history.load()
    }

    pub fn clear_history(&self) -> Result<(), ParleyError> {
        self.history.clear()
    }

    pub fn message_count(&self) -> Result<usize, ParleyError> {
        self.history.len()
    }

    /// Run a one-shot remote operation. History is neither read nor written.
    pub fn trigger_side_effect(&self, effect: &dyn SideEffect) -> Result<String, ParleyError> {
        SideEffectAction::trigger(&self.agent, &self.bridge, effect)
    }

    /// Drop the agent handle and its credentials. History is kept.
    pub fn reset(&self) {
        self.agent.reset();
    }

    pub fn agent(&self) -> &AgentSession {
        &self.agent
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn bridge(&self) -> &InvocationBridge {
        &self.bridge
    }
}

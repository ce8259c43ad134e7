//! Agent system: remote agent contracts, the live handle, and the session
//! state machine that owns it.

pub mod http;
#[cfg(feature = "openai")]
pub mod openai;
pub mod session;

#[cfg(feature = "openai")]
pub use openai::{AgentOptions, OpenAiAgent, OpenAiAgentFactory};
pub use session::{AgentSession, SessionState};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::{AgentError, ParleyError};
use crate::models::ModelId;

/// A configured connection to a remote language-model agent.
#[async_trait]
pub trait RemoteAgent: Send + Sync {
    /// Model this agent was constructed for.
    fn model(&self) -> ModelId;

    /// Send one message and wait for the agent's reply.
    async fn respond(&self, message: &str) -> Result<String, AgentError>;
}

/// Builds remote agents from credentials.
///
/// Construction is synchronous and must not contact the remote; it only
/// validates what it is given and produces a ready-to-use agent.
pub trait AgentFactory: Send + Sync {
    fn construct(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteAgent>, ParleyError>;
}

impl<F> AgentFactory for F
where
    F: Fn(&Credentials) -> Result<Arc<dyn RemoteAgent>, ParleyError> + Send + Sync,
{
    fn construct(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteAgent>, ParleyError> {
        self(credentials)
    }
}

/// The live capability handed out by an initialized [`AgentSession`].
///
/// Cloning is cheap. Calls through clones of the same handle are single-flight:
/// a second `respond` waits until the first has finished.
#[derive(Clone)]
pub struct AgentHandle {
    agent: Arc<dyn RemoteAgent>,
    generation: u64,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("model", &self.agent.model())
            .field("generation", &self.generation)
            .finish()
    }
}

impl AgentHandle {
    pub(crate) fn new(agent: Arc<dyn RemoteAgent>, generation: u64) -> Self {
        Self {
            agent,
            generation,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn model(&self) -> ModelId {
        self.agent.model()
    }

    /// Increases every time the owning session builds a new handle.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn respond(&self, message: &str) -> Result<String, AgentError> {
        let _slot = self.in_flight.lock().await;
        self.agent.respond(message).await
    }
}

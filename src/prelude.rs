//! Convenience re-exports for common use.

pub use crate::action::{Erc721ContractAction, SideEffect, SideEffectAction};
pub use crate::agent::{AgentFactory, AgentHandle, AgentSession, RemoteAgent, SessionState};
#[cfg(feature = "openai")]
pub use crate::agent::{AgentOptions, OpenAiAgentFactory};
pub use crate::bridge::{ExecutionEnvironment, InvocationBridge};
pub use crate::config::{ApiKey, Credentials, ParleyConfig};
pub use crate::error::{AgentError, ParleyError, Result};
pub use crate::history::{HistoryBackend, HistoryStore};
pub use crate::models::ModelId;
pub use crate::session::ChatSession;
pub use crate::types::{Role, Turn};

//! One-shot remote operations gated on session readiness.
//!
//! A side effect never reads or writes chat history and is not deduplicated:
//! every trigger is a fresh remote action.

pub mod contract;

pub use contract::Erc721ContractAction;

use async_trait::async_trait;
use tracing::info;

use crate::agent::{AgentHandle, AgentSession};
use crate::bridge::InvocationBridge;
use crate::error::{AgentError, ParleyError};

/// A self-contained remote operation performed through an agent handle.
#[async_trait]
pub trait SideEffect: Send + Sync {
    /// Short label for logs and menus.
    fn name(&self) -> &str;

    /// Perform the operation and describe the outcome for a human.
    async fn perform(&self, agent: &AgentHandle) -> Result<String, AgentError>;
}

/// Triggers side effects against whatever handle a session currently holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideEffectAction;

impl SideEffectAction {
    /// Run `effect` once. Fails with [`ParleyError::NotReady`] before the
    /// session is initialized, without contacting the remote.
    pub fn trigger(
        session: &AgentSession,
        bridge: &InvocationBridge,
        effect: &dyn SideEffect,
    ) -> Result<String, ParleyError> {
        let handle = session.current()?;
        info!(action = effect.name(), model = %handle.model(), "Triggering side effect");
        bridge
            .run_to_completion(effect.perform(&handle))
            .map_err(ParleyError::Invocation)
    }
}

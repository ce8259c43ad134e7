//! Agent session lifecycle.
//!
//! ```text
//! Uninitialized --initialize(ok)--> Ready
//! Ready --initialize(ok)--> Ready          (handle replaced)
//! any --initialize(err)--> Uninitialized
//! any --reset()--> Uninitialized
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{AgentFactory, AgentHandle};
use crate::config::{ApiKey, Credentials};
use crate::error::ParleyError;
use crate::models::ModelId;

/// Whether a session currently holds a usable agent handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
}

struct LiveAgent {
    credentials: Credentials,
    handle: AgentHandle,
}

/// Owns at most one live [`AgentHandle`] and the credentials it was built from.
pub struct AgentSession {
    factory: Arc<dyn AgentFactory>,
    live: RwLock<Option<LiveAgent>>,
    generation: AtomicU64,
    state_tx: watch::Sender<SessionState>,
}

impl fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSession")
            .field("state", &self.state())
            .field("model", &self.model())
            .finish()
    }
}

impl AgentSession {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Uninitialized);
        Self {
            factory,
            live: RwLock::new(None),
            generation: AtomicU64::new(0),
            state_tx,
        }
    }

    /// Build a new agent handle from `credentials`, replacing any previous one.
    ///
    /// On failure the previous handle (if any) is dropped and the session is
    /// left `Uninitialized`; the error is always [`ParleyError::Init`].
    pub fn initialize(&self, credentials: Credentials) -> Result<SessionState, ParleyError> {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);

        match self.factory.construct(&credentials) {
            Ok(agent) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let replaced = live.is_some();
                info!(
                    model = %credentials.model(),
                    key = %credentials.api_key().fingerprint(),
                    generation,
                    replaced,
                    "Agent session initialized"
                );
                *live = Some(LiveAgent {
                    credentials,
                    handle: AgentHandle::new(agent, generation),
                });
                self.state_tx.send_replace(SessionState::Ready);
                Ok(SessionState::Ready)
            }
            Err(err) => {
                if live.take().is_some() {
                    warn!("Re-initialization failed; previous agent handle discarded");
                }
                self.state_tx.send_replace(SessionState::Uninitialized);
                Err(match err {
                    err @ ParleyError::Init { .. } => err,
                    other => ParleyError::init_with_source("Agent construction failed", other),
                })
            }
        }
    }

    /// Validate raw caller input and initialize from it.
    pub fn initialize_with(
        &self,
        api_key: impl Into<ApiKey>,
        model_id: &str,
    ) -> Result<SessionState, ParleyError> {
        match Credentials::new(api_key, model_id) {
            Ok(credentials) => self.initialize(credentials),
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    /// The live handle, or [`ParleyError::NotReady`].
    pub fn current(&self) -> Result<AgentHandle, ParleyError> {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|live| live.handle.clone())
            .ok_or(ParleyError::NotReady)
    }

    /// Drop the handle and credentials. Chat history is not touched.
    pub fn reset(&self) {
        let previous = self
            .live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            info!("Agent session reset");
        }
        self.state_tx.send_replace(SessionState::Uninitialized);
    }

    pub fn state(&self) -> SessionState {
        if self
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
        {
            SessionState::Ready
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn model(&self) -> Option<ModelId> {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|live| live.credentials.model())
    }

    /// Fingerprint of the active key, safe to display.
    pub fn key_fingerprint(&self) -> Option<String> {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|live| live.credentials.api_key().fingerprint())
    }
}

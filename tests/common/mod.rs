//! Shared test helpers and mock agent.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use parley::agent::{AgentFactory, RemoteAgent};
use parley::bridge::InvocationBridge;
use parley::config::Credentials;
use parley::error::{AgentError, ParleyError};
use parley::history::HistoryStore;
use parley::models::ModelId;
use parley::session::ChatSession;

/// What the mock remote does on its next call.
#[derive(Debug)]
pub enum Scripted {
    Reply(String),
    Fail(AgentError),
}

/// Remote activity shared by every agent a [`MockFactory`] builds.
#[derive(Debug, Default)]
pub struct RemoteLog {
    calls: AtomicUsize,
    /// `(api_key, message)` per call, in call order.
    seen: Mutex<Vec<(String, String)>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl RemoteLog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn queue_reply(&self, text: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(text.to_string()));
    }

    pub fn queue_failure(&self, err: AgentError) {
        self.script.lock().unwrap().push_back(Scripted::Fail(err));
    }
}

/// A mock agent that answers from the shared script, echoing when it runs dry.
pub struct MockAgent {
    api_key: String,
    model: ModelId,
    delay: Duration,
    log: Arc<RemoteLog>,
}

#[async_trait]
impl RemoteAgent for MockAgent {
    fn model(&self) -> ModelId {
        self.model
    }

    async fn respond(&self, message: &str) -> Result<String, AgentError> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .seen
            .lock()
            .unwrap()
            .push((self.api_key.clone(), message.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.log.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(err)) => Err(err),
            None => Ok(format!("echo: {message}")),
        }
    }
}

/// Builds [`MockAgent`]s and counts constructions.
#[derive(Default)]
pub struct MockFactory {
    pub log: Arc<RemoteLog>,
    constructed: AtomicUsize,
    delay: Duration,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }
}

impl AgentFactory for MockFactory {
    fn construct(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteAgent>, ParleyError> {
        let key = credentials.api_key().expose();
        if key.starts_with("bad-") {
            return Err(ParleyError::init("agent library rejected the key format"));
        }
        self.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockAgent {
            api_key: key.to_string(),
            model: credentials.model(),
            delay: self.delay,
            log: Arc::clone(&self.log),
        }))
    }
}

/// A chat session over `factory` with in-memory history.
pub fn session_with(factory: &Arc<MockFactory>) -> ChatSession {
    ChatSession::new(
        Arc::clone(factory) as Arc<dyn AgentFactory>,
        HistoryStore::in_memory(),
        InvocationBridge::new(),
    )
}

//! Chat history: an append-only, replayable log of turns.
//!
//! [`HistoryStore`] owns the ordering and single-writer rules; where the turns
//! actually live is delegated to a [`HistoryBackend`]:
//! - [`MemoryBackend`]: process memory, gone on exit
//! - [`JsonlBackend`]: JSON lines on disk, replayed on the next start

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlBackend;
pub use memory::MemoryBackend;

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::ParleyError;
use crate::types::{Role, Turn};

/// Storage for history records.
///
/// Implementations must keep records in append order and must not reorder or
/// rewrite them; `truncate` is the only way records disappear.
pub trait HistoryBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Write every turn or none of them.
    fn append_batch(&self, turns: &[Turn]) -> Result<(), ParleyError>;

    fn append(&self, turn: &Turn) -> Result<(), ParleyError> {
        self.append_batch(std::slice::from_ref(turn))
    }

    fn read_all(&self) -> Result<Vec<Turn>, ParleyError>;
    fn truncate(&self) -> Result<(), ParleyError>;
}

/// Ordered chat history shared by every invocation of a session.
///
/// All operations are serialized through one lock, so a reader never observes
/// a half-written exchange and two writers never interleave.
pub struct HistoryStore {
    backend: Arc<dyn HistoryBackend>,
    lock: Mutex<()>,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn jsonl(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonlBackend::new(path)))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Record one turn stamped with the current time.
    pub fn append(&self, role: Role, content: impl Into<String>) -> Result<Turn, ParleyError> {
        let turn = Turn::new(role, content);
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.append(&turn)?;
        debug!(backend = self.backend.name(), role = %role, "Turn appended");
        Ok(turn)
    }

    /// Record a user message and the reply it produced as one unit: either both
    /// turns land or neither does.
    pub fn append_exchange(
        &self,
        message: impl Into<String>,
        reply: impl Into<String>,
    ) -> Result<(Turn, Turn), ParleyError> {
        let user = Turn::user(message);
        let assistant = Turn::assistant(reply);
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.append_batch(&[user.clone(), assistant.clone()])?;
        debug!(backend = self.backend.name(), "Exchange appended");
        Ok((user, assistant))
    }

    /// Full history in append order. Holds no cursor; every call starts over.
    pub fn load(&self) -> Result<Vec<Turn>, ParleyError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.read_all()
    }

    /// Drop every recorded turn. Sequences already returned by `load` are unaffected.
    pub fn clear(&self) -> Result<(), ParleyError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.truncate()?;
        debug!(backend = self.backend.name(), "History cleared");
        Ok(())
    }

    pub fn len(&self) -> Result<usize, ParleyError> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ParleyError> {
        Ok(self.len()? == 0)
    }
}

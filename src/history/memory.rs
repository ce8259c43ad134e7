//! Process-memory history backend.

use std::sync::{PoisonError, RwLock};

use super::HistoryBackend;
use crate::error::ParleyError;
use crate::types::Turn;

/// Keeps turns in a `Vec` for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    turns: RwLock<Vec<Turn>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn append_batch(&self, turns: &[Turn]) -> Result<(), ParleyError> {
        self.turns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(turns);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Turn>, ParleyError> {
        Ok(self
            .turns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn truncate(&self) -> Result<(), ParleyError> {
        self.turns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

use super::{SelectionState, SelectionStore};
use crate::error::AppResult;
use moka::sync::Cache;
use std::time::Duration;

/// In-process selection store. By default state lives as long as the
/// process; capacity and idle eviction are opt-in.
pub struct MemorySelectionStore {
    inner: Cache<String, SelectionState>,
}

impl Default for MemorySelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySelectionStore {
    /// Unbounded, never expires.
    pub fn new() -> Self {
        Self::with_limits(None, None)
    }

    pub fn with_limits(max_sessions: Option<u64>, idle_ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder();
        if let Some(max) = max_sessions {
            builder = builder.max_capacity(max);
        }
        if let Some(ttl) = idle_ttl {
            builder = builder.time_to_idle(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }
}

impl SelectionStore for MemorySelectionStore {
    fn get(&self, key: &str) -> AppResult<SelectionState> {
        Ok(self.inner.get(key).unwrap_or_default())
    }

    fn save(&self, key: &str, state: &SelectionState) -> AppResult<()> {
        self.inner.insert(key.to_string(), state.clone());
        Ok(())
    }
}

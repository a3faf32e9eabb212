//! Per-key write serialization
//!
//! The daily-cap read plus the ledger append form a read-modify-write on
//! the (contest, participant) pair. Each pair gets its own lock so that
//! concurrent close events for the same participant cannot double-spend
//! the remaining daily allowance, while different participants record in
//! parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::{Error, Result};

/// Registry handing out one lock per (contest, participant) key.
pub struct KeyLocks {
    inner: Mutex<HashMap<(Uuid, String), Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Get the lock for a key, creating it on first use. Callers hold the
    /// returned lock for the whole read-modify-write.
    pub fn acquire(&self, contest_id: Uuid, participant_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut map = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        let lock = map
            .entry((contest_id, participant_id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Ok(lock)
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new()
    }
}

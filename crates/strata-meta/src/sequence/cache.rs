//! Client-side sequence batches.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use strata_common::types::Timestamp;
use strata_common::{StrataError, StrataResult};
use tracing::{debug, warn};

use super::{SequenceBatch, SequenceKey, SequenceStore};

#[derive(Debug, Default)]
struct CachedSequence {
    /// Values reserved but not yet handed out.
    batch: Option<SequenceBatch>,
    /// Last value handed out.
    current: Option<i64>,
}

/// Serves sequence values from locally reserved batches.
///
/// Each sequence has its own lock, held while a new batch is reserved, so
/// callers of one sequence never reserve twice for the same exhaustion
/// and callers of different sequences never wait on each other.
#[derive(Debug)]
pub struct SequenceCache {
    store: SequenceStore,
    sequences: DashMap<SequenceKey, Arc<Mutex<CachedSequence>>>,
}

impl SequenceCache {
    /// Creates an empty cache over `store`.
    pub fn new(store: SequenceStore) -> Self {
        Self {
            store,
            sequences: DashMap::new(),
        }
    }

    /// The backing sequence records.
    pub fn store(&self) -> &SequenceStore {
        &self.store
    }

    fn entry(&self, key: &SequenceKey) -> Arc<Mutex<CachedSequence>> {
        Arc::clone(self.sequences.entry(key.clone()).or_default().value())
    }

    /// Hands out the next value of each sequence, reserving a new batch
    /// where the local one is used up. Results line up with `keys`.
    pub fn next_values(&self, keys: &[SequenceKey], ts: Timestamp) -> Vec<StrataResult<i64>> {
        keys.iter().map(|key| self.next_value(key, ts)).collect()
    }

    fn next_value(&self, key: &SequenceKey, ts: Timestamp) -> StrataResult<i64> {
        let entry = self.entry(key);
        let mut cached = entry.lock();
        if let Some(value) = cached.batch.as_mut().and_then(SequenceBatch::take_first) {
            cached.current = Some(value);
            return Ok(value);
        }
        let mut batch = self.store.reserve(key, ts)?;
        let value = batch
            .take_first()
            .ok_or_else(|| StrataError::internal(format!("sequence {key} reserved an empty batch")))?;
        cached.batch = Some(batch);
        cached.current = Some(value);
        Ok(value)
    }

    /// Last value handed out for `key` by this cache.
    pub fn current_value(&self, key: &SequenceKey) -> StrataResult<i64> {
        self.sequences
            .get(key)
            .map(|e| Arc::clone(e.value()))
            .and_then(|e| e.lock().current)
            .ok_or_else(|| {
                StrataError::invalid_argument(format!(
                    "CURRENT VALUE FOR {key} before any NEXT VALUE FOR"
                ))
            })
    }

    /// Gives unused reserved values back to the store, best effort.
    ///
    /// The local batches are discarded either way; failures are logged.
    pub fn return_values(&self, keys: &[SequenceKey], ts: Timestamp) {
        for key in keys {
            let Some(entry) = self.sequences.get(key).map(|e| Arc::clone(e.value())) else {
                continue;
            };
            let Some(unused) = entry.lock().batch.take() else {
                continue;
            };
            match self.store.return_values(&unused, ts) {
                Ok(true) => debug!(sequence = %key, count = unused.count, "returned sequence values"),
                Ok(false) => debug!(sequence = %key, "sequence advanced, unused values dropped"),
                Err(e) => warn!(sequence = %key, error = %e, "failed to return sequence values"),
            }
        }
    }

    /// Forgets everything cached for `key`.
    pub fn invalidate(&self, key: &SequenceKey) {
        self.sequences.remove(key);
    }
}

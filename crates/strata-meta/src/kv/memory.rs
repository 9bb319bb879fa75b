//! In-memory key-value store.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use bytes::Bytes;
use parking_lot::RwLock;
use strata_common::types::{Key, Timestamp};
use strata_common::{StrataError, StrataResult};

use super::{KeyValueStore, KvWrite, VersionedValue};

/// Version history of one key, oldest first. `None` marks a delete.
type Versions = Vec<(Timestamp, Option<Bytes>)>;

/// A [`KeyValueStore`] held in a B-tree of version lists.
///
/// Writes take the write lock for their whole duration, so conditional
/// writes are atomic.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    rows: RwLock<BTreeMap<Key, Versions>>,
    failures: AtomicUsize,
}

impl MemoryKvStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` write operations fail with a transient error.
    pub fn inject_transient_failures(&self, count: usize) {
        self.failures.store(count, AtomicOrdering::Release);
    }

    /// Number of keys with at least one version.
    pub fn key_count(&self) -> usize {
        self.rows.read().len()
    }

    fn check_failure(&self, operation: &str) -> StrataResult<()> {
        let injected = self
            .failures
            .fetch_update(AtomicOrdering::AcqRel, AtomicOrdering::Acquire, |n| n.checked_sub(1));
        match injected {
            Ok(_) => Err(StrataError::TransientStore {
                operation: operation.to_string(),
                reason: "injected failure".to_string(),
            }),
            Err(_) => Ok(()),
        }
    }
}

fn visible_at(versions: &Versions, ts: Timestamp) -> Option<VersionedValue> {
    versions
        .iter()
        .rev()
        .find(|(version_ts, _)| *version_ts <= ts)
        .and_then(|(version_ts, value)| {
            value.as_ref().map(|v| VersionedValue {
                value: v.clone(),
                timestamp: *version_ts,
            })
        })
}

fn latest(rows: &BTreeMap<Key, Versions>, key: &Key) -> Option<Bytes> {
    rows.get(key)
        .and_then(|versions| versions.last())
        .and_then(|(_, value)| value.clone())
}

/// Appends a version. A write older than the newest version takes the
/// newest version's timestamp.
fn write_version(rows: &mut BTreeMap<Key, Versions>, key: Key, value: Option<Bytes>, ts: Timestamp) {
    let versions = rows.entry(key).or_default();
    match versions.last_mut() {
        Some(last) if last.0 >= ts => last.1 = value,
        _ => versions.push((ts, value)),
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get_at(&self, key: &Key, ts: Timestamp) -> StrataResult<Option<VersionedValue>> {
        Ok(self.rows.read().get(key).and_then(|v| visible_at(v, ts)))
    }

    fn put(&self, key: Key, value: Bytes, ts: Timestamp) -> StrataResult<()> {
        self.check_failure("put")?;
        write_version(&mut self.rows.write(), key, Some(value), ts);
        Ok(())
    }

    fn delete(&self, key: &Key, ts: Timestamp) -> StrataResult<()> {
        self.check_failure("delete")?;
        let mut rows = self.rows.write();
        if rows.contains_key(key) {
            write_version(&mut rows, key.clone(), None, ts);
        }
        Ok(())
    }

    fn check_and_put(
        &self,
        key: Key,
        expected: Option<&[u8]>,
        value: Option<Bytes>,
        ts: Timestamp,
    ) -> StrataResult<bool> {
        self.check_failure("check_and_put")?;
        let mut rows = self.rows.write();
        if latest(&rows, &key).as_deref() != expected {
            return Ok(false);
        }
        write_version(&mut rows, key, value, ts);
        Ok(true)
    }

    fn check_and_mutate(
        &self,
        check_key: &Key,
        expected: Option<&[u8]>,
        writes: Vec<KvWrite>,
        ts: Timestamp,
    ) -> StrataResult<bool> {
        self.check_failure("check_and_mutate")?;
        let mut rows = self.rows.write();
        if latest(&rows, check_key).as_deref() != expected {
            return Ok(false);
        }
        for write in writes {
            match write {
                KvWrite::Put { key, value } => write_version(&mut rows, key, Some(value), ts),
                KvWrite::Delete { key } => write_version(&mut rows, key, None, ts),
            }
        }
        Ok(true)
    }

    fn scan_prefix_at(&self, prefix: &[u8], ts: Timestamp) -> StrataResult<Vec<(Key, VersionedValue)>> {
        let rows = self.rows.read();
        let start = Key::from_bytes(prefix);
        let end = match start.prefix_successor() {
            end if end.is_empty() => Bound::Unbounded,
            end => Bound::Excluded(end),
        };
        Ok(rows
            .range((Bound::Included(start), end))
            .filter_map(|(key, versions)| visible_at(versions, ts).map(|v| (key.clone(), v)))
            .collect())
    }
}

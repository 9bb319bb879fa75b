//! Key-value store capability.
//!
//! The coordination service keeps catalog rows and sequence records in a
//! sorted, versioned key-value store. Every write carries a timestamp and
//! reads are "as of" a timestamp, seeing the newest version at or before
//! it. Conditional writes compare against the newest version overall.
//! Versions of a key only move forward: a write stamped older than the
//! newest version is applied at the newest version's timestamp.

mod memory;

pub use memory::MemoryKvStore;

use std::fmt;

use bytes::Bytes;
use strata_common::types::{Key, Timestamp};
use strata_common::StrataResult;

/// A value together with the timestamp it was written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// Stored bytes.
    pub value: Bytes,
    /// Write timestamp.
    pub timestamp: Timestamp,
}

/// One write of a conditional batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    /// Stores `value` under `key`.
    Put {
        /// Row key.
        key: Key,
        /// New value.
        value: Bytes,
    },
    /// Removes `key`.
    Delete {
        /// Row key.
        key: Key,
    },
}

impl KvWrite {
    /// The key written.
    pub fn key(&self) -> &Key {
        match self {
            KvWrite::Put { key, .. } | KvWrite::Delete { key } => key,
        }
    }
}

/// A sorted, versioned key-value store.
///
/// Implementations must be safe to share between threads. Failures are
/// reported as `TransientStore` (safe to retry) or `PermanentStore` errors.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Reads the newest version of `key` written at or before `ts`.
    fn get_at(&self, key: &Key, ts: Timestamp) -> StrataResult<Option<VersionedValue>>;

    /// Writes `value` at `ts`.
    fn put(&self, key: Key, value: Bytes, ts: Timestamp) -> StrataResult<()>;

    /// Deletes `key` as of `ts`. Earlier versions stay readable at earlier
    /// timestamps.
    fn delete(&self, key: &Key, ts: Timestamp) -> StrataResult<()>;

    /// Writes `value` (or deletes, for `None`) at `ts` if the newest version
    /// of `key` equals `expected`. `None` expects the key to be absent.
    ///
    /// Returns false, writing nothing, if the check fails.
    fn check_and_put(
        &self,
        key: Key,
        expected: Option<&[u8]>,
        value: Option<Bytes>,
        ts: Timestamp,
    ) -> StrataResult<bool>;

    /// Applies all `writes` at `ts` atomically if the newest version of
    /// `check_key` equals `expected`.
    fn check_and_mutate(
        &self,
        check_key: &Key,
        expected: Option<&[u8]>,
        writes: Vec<KvWrite>,
        ts: Timestamp,
    ) -> StrataResult<bool>;

    /// Returns every live key starting with `prefix` as of `ts`, in key order.
    fn scan_prefix_at(&self, prefix: &[u8], ts: Timestamp) -> StrataResult<Vec<(Key, VersionedValue)>>;
}

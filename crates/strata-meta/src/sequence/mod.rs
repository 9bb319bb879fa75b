//! Sequences.
//!
//! A sequence is one record in the key-value store holding the next value
//! to hand out. Clients never take single values from the store: they
//! reserve a batch of `cache_size` values with one conditional write and
//! serve `NEXT VALUE FOR` from it locally (see [`SequenceCache`]).
//!
//! Reservation is a compare-and-set loop on the record, so concurrent
//! reservers of one sequence get disjoint, increasing batches.

mod cache;

pub use cache::SequenceCache;

use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use strata_common::types::{Key, Timestamp};
use strata_common::{StrataError, StrataResult, SEPARATOR_BYTE};
use tracing::{debug, trace};

use crate::kv::KeyValueStore;
use crate::row_key::{full_table_name, TenantId};

/// Leading bytes of sequence record keys, outside any tenant's catalog rows.
const SEQUENCE_KEY_PREFIX: &[u8] = b"\xFFSEQ";

/// Identity of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceKey {
    /// Owning tenant.
    pub tenant: TenantId,
    /// Schema name, empty for the default schema.
    pub schema: String,
    /// Sequence name.
    pub name: String,
}

impl SequenceKey {
    /// Creates a key.
    pub fn new(tenant: TenantId, schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant,
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Store key of the sequence record.
    pub fn row_key(&self) -> Key {
        let mut buf = Vec::with_capacity(
            SEQUENCE_KEY_PREFIX.len() + self.tenant.as_bytes().len() + self.schema.len() + self.name.len() + 3,
        );
        buf.extend_from_slice(SEQUENCE_KEY_PREFIX);
        for part in [self.tenant.as_bytes(), self.schema.as_bytes(), self.name.as_bytes()] {
            buf.push(SEPARATOR_BYTE);
            buf.extend_from_slice(part);
        }
        Key::from_vec(buf)
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&full_table_name(&self.schema, &self.name))
    }
}

/// Stored state of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SequenceRecord {
    /// Next value to hand out.
    pub current_value: i64,
    pub increment: i64,
    pub cache_size: u32,
    pub start: i64,
}

impl SequenceRecord {
    const ENCODED_LEN: usize = 8 + 8 + 4 + 8;

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::ENCODED_LEN);
        buf.put_i64(self.current_value);
        buf.put_i64(self.increment);
        buf.put_u32(self.cache_size);
        buf.put_i64(self.start);
        buf.freeze()
    }

    fn decode(key: &SequenceKey, bytes: &[u8]) -> StrataResult<Self> {
        if bytes.len() < Self::ENCODED_LEN {
            return Err(StrataError::PermanentStore {
                operation: format!("read sequence {key}"),
                reason: format!("record has {} bytes, expected {}", bytes.len(), Self::ENCODED_LEN),
            });
        }
        let mut buf = bytes;
        Ok(Self {
            current_value: buf.get_i64(),
            increment: buf.get_i64(),
            cache_size: buf.get_u32(),
            start: buf.get_i64(),
        })
    }
}

/// A contiguous run of reserved values: `first`, `first + increment`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBatch {
    /// Sequence the values belong to.
    pub key: SequenceKey,
    /// First value.
    pub first: i64,
    /// Step between values.
    pub increment: i64,
    /// Number of values.
    pub count: u32,
}

impl SequenceBatch {
    /// The values in order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        (0..i64::from(self.count)).map(move |i| self.first + i * self.increment)
    }

    /// Last value, `None` if the batch is empty.
    pub fn last(&self) -> Option<i64> {
        self.count
            .checked_sub(1)
            .map(|n| self.first + i64::from(n) * self.increment)
    }

    /// Returns true if no value is left.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Removes and returns the first value.
    pub fn take_first(&mut self) -> Option<i64> {
        if self.count == 0 {
            return None;
        }
        let value = self.first;
        self.count -= 1;
        if self.count > 0 {
            self.first += self.increment;
        }
        Some(value)
    }

    /// Value that follows the batch in the sequence.
    fn end(&self) -> Option<i64> {
        self.increment
            .checked_mul(i64::from(self.count))
            .and_then(|span| self.first.checked_add(span))
    }
}

/// Sequence records in a key-value store.
#[derive(Debug, Clone)]
pub struct SequenceStore {
    store: Arc<dyn KeyValueStore>,
    max_cas_attempts: u32,
}

impl SequenceStore {
    /// Creates a store over `store`, retrying lost compare-and-sets up to
    /// `max_cas_attempts` times.
    pub fn new(store: Arc<dyn KeyValueStore>, max_cas_attempts: u32) -> Self {
        Self {
            store,
            max_cas_attempts,
        }
    }

    /// Creates a sequence. At most one of several concurrent creators wins.
    pub fn create(
        &self,
        key: &SequenceKey,
        start: i64,
        increment: i64,
        cache_size: u32,
        ts: Timestamp,
    ) -> StrataResult<()> {
        if increment == 0 {
            return Err(StrataError::invalid_argument(format!(
                "sequence {key} must have a non-zero increment"
            )));
        }
        if cache_size == 0 {
            return Err(StrataError::invalid_argument(format!(
                "sequence {key} must have a positive cache size"
            )));
        }
        let record = SequenceRecord {
            current_value: start,
            increment,
            cache_size,
            start,
        };
        if !self
            .store
            .check_and_put(key.row_key(), None, Some(record.encode()), ts)?
        {
            return Err(StrataError::SequenceAlreadyExists {
                sequence: key.to_string(),
            });
        }
        debug!(sequence = %key, start, increment, cache_size, "created sequence");
        Ok(())
    }

    /// Drops a sequence.
    pub fn remove(&self, key: &SequenceKey, ts: Timestamp) -> StrataResult<()> {
        let row = key.row_key();
        for _ in 0..self.max_cas_attempts {
            let current = self.load_latest(key)?;
            if self
                .store
                .check_and_put(row.clone(), Some(&current.value[..]), None, ts)?
            {
                debug!(sequence = %key, "dropped sequence");
                return Ok(());
            }
        }
        Err(self.contended(key, "remove"))
    }

    /// Reserves the next batch of the record's cache size.
    ///
    /// Fails with `SequenceNotFound` if the sequence does not exist as of
    /// `ts`.
    pub fn reserve(&self, key: &SequenceKey, ts: Timestamp) -> StrataResult<SequenceBatch> {
        let row = key.row_key();
        if self.store.get_at(&row, ts)?.is_none() {
            return Err(not_found(key));
        }
        for attempt in 0..self.max_cas_attempts {
            let current = self.load_latest(key)?;
            let record = SequenceRecord::decode(key, &current.value)?;
            let batch = SequenceBatch {
                key: key.clone(),
                first: record.current_value,
                increment: record.increment,
                count: record.cache_size,
            };
            let next = batch.end().ok_or_else(|| StrataError::SequenceExhausted {
                sequence: key.to_string(),
            })?;
            let updated = SequenceRecord {
                current_value: next,
                ..record
            };
            if self
                .store
                .check_and_put(row.clone(), Some(&current.value[..]), Some(updated.encode()), ts)?
            {
                debug!(sequence = %key, first = batch.first, count = batch.count, "reserved sequence batch");
                return Ok(batch);
            }
            trace!(sequence = %key, attempt, "sequence reservation lost a race, retrying");
        }
        Err(self.contended(key, "reserve"))
    }

    /// Gives back the unused tail of a batch.
    ///
    /// Succeeds only if nothing was reserved after the batch; returns false
    /// otherwise.
    pub fn return_values(&self, unused: &SequenceBatch, ts: Timestamp) -> StrataResult<bool> {
        if unused.is_empty() {
            return Ok(true);
        }
        let key = &unused.key;
        let Some(end) = unused.end() else {
            return Ok(false);
        };
        let current = self.load_latest(key)?;
        let record = SequenceRecord::decode(key, &current.value)?;
        if record.current_value != end {
            return Ok(false);
        }
        let updated = SequenceRecord {
            current_value: unused.first,
            ..record
        };
        self.store
            .check_and_put(key.row_key(), Some(&current.value[..]), Some(updated.encode()), ts)
    }

    fn load_latest(&self, key: &SequenceKey) -> StrataResult<crate::kv::VersionedValue> {
        self.store
            .get_at(&key.row_key(), Timestamp::MAX)?
            .ok_or_else(|| not_found(key))
    }

    fn contended(&self, key: &SequenceKey, operation: &str) -> StrataError {
        StrataError::TransientStore {
            operation: format!("{operation} sequence {key}"),
            reason: format!("lost {} consecutive conditional writes", self.max_cas_attempts),
        }
    }
}

fn not_found(key: &SequenceKey) -> StrataError {
    StrataError::SequenceNotFound {
        sequence: key.to_string(),
    }
}

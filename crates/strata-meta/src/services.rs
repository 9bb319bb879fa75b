//! The coordination service.
//!
//! [`QueryServices`] owns the connection-wide state: the key-value store,
//! the clock, the cached [`MetadataStore`], the sequence batch cache and
//! the per-tenant child services. Catalog mutations arrive as row-level
//! [`Mutation`] lists and are applied with one conditional batch against
//! the table header row, so of two concurrent writers exactly one wins
//! and the other sees the winner's table.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use strata_common::config::EngineConfig;
use strata_common::types::{SystemClock, Timestamp, TimestampSource};
use strata_common::{StrataError, StrataResult, TABLE_FAMILY};
use tracing::{debug, info, trace};

use crate::features::Feature;
use crate::kv::{KeyValueStore, KvWrite, MemoryKvStore};
use crate::metadata::MetadataStore;
use crate::mutation::{self, Mutation, MutationKind};
use crate::result::{MutationCode, MutationResult};
use crate::row_key::{self, RowKeyParts, TenantId};
use crate::sequence::{SequenceBatch, SequenceCache, SequenceKey, SequenceStore};
use crate::table::{ColumnDef, IndexState, TableSnapshot, TableType};

/// Operations the query engine needs from the metadata layer.
///
/// Catalog operations return a [`MutationResult`] for outcomes a client
/// is expected to handle (table missing, lost race, newer table found)
/// and an error only for malformed requests or store failures.
pub trait CoordinationService: Send + Sync + fmt::Debug {
    /// The service for `tenant`, created on first use and shared after.
    fn child_service(&self, tenant: &TenantId) -> Arc<dyn CoordinationService>;

    /// Current time of the service clock.
    fn now(&self) -> Timestamp;

    /// Snapshot of the cached tables.
    fn metadata(&self) -> MetadataStore;

    /// Caches `table`, replacing an older version.
    fn add_table(&self, table: TableSnapshot) -> MetadataStore;

    /// Appends columns to a cached table.
    fn add_columns(
        &self,
        table_name: &str,
        columns: Vec<ColumnDef>,
        timestamp: Timestamp,
        sequence_number: u64,
        immutable_rows: bool,
    ) -> StrataResult<MetadataStore>;

    /// Drops a table from the cache.
    fn remove_table(&self, table_name: &str) -> StrataResult<MetadataStore>;

    /// Drops a column from a cached table.
    fn remove_column(
        &self,
        table_name: &str,
        family: Option<&str>,
        column: &str,
        timestamp: Timestamp,
        sequence_number: u64,
    ) -> StrataResult<MetadataStore>;

    /// Compares a client's cached table against the catalog as of
    /// `client_timestamp`.
    ///
    /// Reports `TableNotFound`, `TableAlreadyExists` when the client copy
    /// (written at `table_timestamp`) is current, or `NewerTableFound`
    /// with the newer table.
    fn resolve_table(
        &self,
        tenant: &TenantId,
        schema: &str,
        table: &str,
        table_timestamp: Timestamp,
        client_timestamp: Timestamp,
    ) -> StrataResult<MutationResult>;

    /// Creates the table described by `mutations`: the header row followed
    /// by one row per column.
    fn create_table(&self, mutations: &[Mutation]) -> StrataResult<MutationResult>;

    /// Drops a table of type `table_type` together with its column rows.
    fn drop_table(&self, mutations: &[Mutation], table_type: TableType) -> StrataResult<MutationResult>;

    /// Adds columns. The header row must carry the next sequence number.
    fn add_column(&self, mutations: &[Mutation]) -> StrataResult<MutationResult>;

    /// Drops columns. The header row must carry the next sequence number.
    fn drop_column(&self, mutations: &[Mutation]) -> StrataResult<MutationResult>;

    /// Moves an index of `parent_table` to the state in the header row.
    fn update_index_state(&self, mutations: &[Mutation], parent_table: &str) -> StrataResult<MutationResult>;

    /// Creates a sequence. A `cache_size` of zero uses the configured
    /// default.
    fn create_sequence(
        &self,
        key: &SequenceKey,
        start: i64,
        increment: i64,
        cache_size: u32,
        ts: Timestamp,
    ) -> StrataResult<()>;

    /// Drops a sequence and forgets its cached batch.
    fn drop_sequence(&self, key: &SequenceKey, ts: Timestamp) -> StrataResult<()>;

    /// Reserves one batch per key straight from the store. Results line up
    /// with `keys`; one failing key does not affect the others.
    fn reserve_sequence_values(&self, keys: &[SequenceKey], ts: Timestamp) -> Vec<StrataResult<SequenceBatch>>;

    /// Next value of each sequence, served from the batch cache.
    fn increment_sequence_values(&self, keys: &[SequenceKey], ts: Timestamp) -> Vec<StrataResult<i64>>;

    /// Last value handed out for `key` through this service.
    fn current_sequence_value(&self, key: &SequenceKey) -> StrataResult<i64>;

    /// Gives cached but unused values back, best effort.
    fn return_sequence_values(&self, keys: &[SequenceKey], ts: Timestamp);

    /// Gives back batches obtained from [`reserve_sequence_values`] that
    /// the caller did not use. A batch is taken back only while nothing was
    /// reserved after it; the result is `Ok(false)` otherwise. Results line
    /// up with `batches`.
    ///
    /// [`reserve_sequence_values`]: CoordinationService::reserve_sequence_values
    fn return_reserved_values(&self, batches: &[SequenceBatch], ts: Timestamp) -> Vec<StrataResult<bool>>;

    /// Whether the store supports `feature`.
    fn supports_feature(&self, feature: Feature) -> bool;
}

/// The coordination service over a key-value store.
#[derive(Debug)]
pub struct QueryServices {
    tenant: Option<TenantId>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimestampSource>,
    config: Arc<EngineConfig>,
    metadata: RwLock<MetadataStore>,
    children: DashMap<TenantId, Arc<QueryServices>>,
    sequences: Arc<SequenceCache>,
}

impl QueryServices {
    /// Creates a service over `store`.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn TimestampSource>,
        config: EngineConfig,
    ) -> StrataResult<Self> {
        config.validate()?;
        let sequences = SequenceStore::new(Arc::clone(&store), config.sequence.max_cas_attempts);
        info!(
            max_cached_tables = config.metadata.max_cached_tables,
            sequence_cache_size = config.sequence.default_cache_size,
            "starting query services"
        );
        Ok(Self {
            tenant: None,
            metadata: RwLock::new(MetadataStore::new(config.metadata.max_cached_tables)),
            store,
            clock,
            config: Arc::new(config),
            children: DashMap::new(),
            sequences: Arc::new(SequenceCache::new(sequences)),
        })
    }

    /// A service over a fresh in-memory store and the system clock.
    pub fn in_memory(config: EngineConfig) -> StrataResult<Self> {
        Self::new(Arc::new(MemoryKvStore::new()), Arc::new(SystemClock::new()), config)
    }

    /// Tenant this service is bound to; `None` for the root service.
    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// The child service for `tenant`.
    ///
    /// Concurrent callers for the same tenant get the same instance. A new
    /// child shares the store, the clock and the sequence cache, and starts
    /// from this service's cached tables.
    pub fn child(&self, tenant: &TenantId) -> Arc<QueryServices> {
        let entry = self.children.entry(tenant.clone()).or_insert_with(|| {
            debug!(tenant = %tenant, "creating child services");
            Arc::new(QueryServices {
                tenant: Some(tenant.clone()),
                store: Arc::clone(&self.store),
                clock: Arc::clone(&self.clock),
                config: Arc::clone(&self.config),
                metadata: RwLock::new(self.metadata()),
                children: DashMap::new(),
                sequences: Arc::clone(&self.sequences),
            })
        });
        Arc::clone(entry.value())
    }

    fn update_metadata(
        &self,
        f: impl FnOnce(&MetadataStore) -> StrataResult<MetadataStore>,
    ) -> StrataResult<MetadataStore> {
        let mut guard = self.metadata.write();
        let next = f(&guard)?;
        *guard = next.clone();
        Ok(next)
    }

    /// Reads a table with its columns as of `ts`, along with the stored
    /// header row value.
    fn load_table(
        &self,
        tenant: &TenantId,
        schema: &str,
        table: &str,
        ts: Timestamp,
    ) -> StrataResult<Option<(TableSnapshot, Bytes)>> {
        let header_key = row_key::table_key(tenant, schema, table);
        let Some(header) = self.store.get_at(&header_key, ts)? else {
            return Ok(None);
        };
        let parts = row_key::split(&header_key)?;
        let cells = mutation::decode_cells(&header.value)?;
        let mut snapshot = mutation::decode_header(&parts, &cells, header.timestamp)?;

        let prefix = row_key::column_prefix(tenant, schema, table);
        for (key, value) in self.store.scan_prefix_at(&prefix, ts)? {
            let parts = row_key::split(&key)?;
            let cells = mutation::decode_cells(&value.value)?;
            snapshot.columns.push(mutation::decode_column(&parts, &cells)?);
        }
        snapshot.columns.sort_by_key(|c| c.position);
        Ok(Some((snapshot, header.value)))
    }

    fn load_latest(&self, parts: &RowKeyParts) -> StrataResult<Option<(TableSnapshot, Bytes)>> {
        self.load_table(&parts.tenant, &parts.schema, &parts.table, Timestamp::MAX)
    }

    /// Applies `writes` if the header row still holds `expected`.
    fn commit(
        &self,
        table: &RowKeyParts,
        expected: Option<&[u8]>,
        writes: Vec<KvWrite>,
        ts: Timestamp,
    ) -> StrataResult<bool> {
        let header_key = row_key::table_key(&table.tenant, &table.schema, &table.table);
        self.store.check_and_mutate(&header_key, expected, writes, ts)
    }

    fn contended(&self, table: &RowKeyParts, operation: &str) -> StrataError {
        StrataError::TransientStore {
            operation: operation.to_string(),
            reason: format!(
                "table {} changed concurrently {} times",
                table.full_table_name(),
                self.config.metadata.max_cas_attempts
            ),
        }
    }

    fn max_attempts(&self) -> u32 {
        self.config.metadata.max_cas_attempts
    }
}

/// Splits a mutation list into its header mutation and the rest.
fn split_header(mutations: &[Mutation]) -> StrataResult<(&Mutation, RowKeyParts, &[Mutation])> {
    let (header, rest) = mutations
        .split_first()
        .ok_or_else(|| StrataError::invalid_argument("empty mutation list"))?;
    let parts = header.row_parts()?;
    if !parts.is_table_row() {
        return Err(StrataError::invalid_argument(
            "first mutation must target the table header row",
        ));
    }
    if &header.family[..] != TABLE_FAMILY {
        return Err(StrataError::invalid_argument("header mutation has the wrong family"));
    }
    for m in rest {
        let column = m.row_parts()?;
        if column.is_table_row()
            || column.tenant != parts.tenant
            || column.schema != parts.schema
            || column.table != parts.table
        {
            return Err(StrataError::invalid_argument(format!(
                "mutation for {} does not belong to {}",
                column.full_table_name(),
                parts.full_table_name()
            )));
        }
    }
    Ok((header, parts, rest))
}

fn required_sequence_number(header: &Mutation) -> StrataResult<u64> {
    mutation::sequence_number_cell(&header.cells)?
        .ok_or_else(|| StrataError::invalid_argument("schema change carries no TABLE_SEQ_NUM"))
}

/// Writes replacing every catalog row of `table`.
fn snapshot_writes(table: &TableSnapshot) -> Vec<KvWrite> {
    let mut writes = vec![KvWrite::Put {
        key: row_key::table_key(&table.tenant, &table.schema, &table.name),
        value: mutation::encode_cells(&mutation::header_cells(table)),
    }];
    writes.extend(table.columns.iter().map(|c| KvWrite::Put {
        key: row_key::column_key(&table.tenant, &table.schema, &table.name, &c.name, c.family_key()),
        value: mutation::encode_cells(&mutation::column_cells(c)),
    }));
    writes
}

/// Index states that may only be reached from `Disable` through `Rebuild`.
fn blocked_after_disable(state: IndexState) -> bool {
    matches!(
        state,
        IndexState::Usable | IndexState::Unusable | IndexState::Active | IndexState::Inactive
    )
}

impl CoordinationService for QueryServices {
    fn child_service(&self, tenant: &TenantId) -> Arc<dyn CoordinationService> {
        self.child(tenant)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn metadata(&self) -> MetadataStore {
        self.metadata.read().clone()
    }

    fn add_table(&self, table: TableSnapshot) -> MetadataStore {
        let mut guard = self.metadata.write();
        let next = guard.add_table(table);
        *guard = next.clone();
        next
    }

    fn add_columns(
        &self,
        table_name: &str,
        columns: Vec<ColumnDef>,
        timestamp: Timestamp,
        sequence_number: u64,
        immutable_rows: bool,
    ) -> StrataResult<MetadataStore> {
        self.update_metadata(|m| m.add_columns(table_name, columns, timestamp, sequence_number, immutable_rows))
    }

    fn remove_table(&self, table_name: &str) -> StrataResult<MetadataStore> {
        self.update_metadata(|m| m.remove_table(table_name))
    }

    fn remove_column(
        &self,
        table_name: &str,
        family: Option<&str>,
        column: &str,
        timestamp: Timestamp,
        sequence_number: u64,
    ) -> StrataResult<MetadataStore> {
        self.update_metadata(|m| m.remove_column(table_name, family, column, timestamp, sequence_number))
    }

    fn resolve_table(
        &self,
        tenant: &TenantId,
        schema: &str,
        table: &str,
        table_timestamp: Timestamp,
        client_timestamp: Timestamp,
    ) -> StrataResult<MutationResult> {
        let now = self.clock.now();
        let result = match self.load_table(tenant, schema, table, client_timestamp)? {
            None => MutationResult::new(MutationCode::TableNotFound, now),
            Some((found, _)) if found.timestamp <= table_timestamp => {
                MutationResult::new(MutationCode::TableAlreadyExists, now)
            }
            Some((found, _)) => MutationResult::with_table(MutationCode::NewerTableFound, now, Arc::new(found)),
        };
        trace!(
            table = %row_key::full_table_name(schema, table),
            code = %result.code,
            "resolved table"
        );
        Ok(result)
    }

    fn create_table(&self, mutations: &[Mutation]) -> StrataResult<MutationResult> {
        let (header, parts, rest) = split_header(mutations)?;
        let mut columns = Vec::with_capacity(rest.len());
        for m in rest {
            if m.kind != MutationKind::Put {
                return Err(StrataError::invalid_argument("create table carries a column delete"));
            }
            columns.push(mutation::decode_column(&m.row_parts()?, &m.cells)?);
        }
        columns.sort_by_key(|c| c.position);

        for _ in 0..self.max_attempts() {
            if let Some((existing, _)) = self.load_latest(&parts)? {
                return Ok(MutationResult::with_table(
                    MutationCode::TableAlreadyExists,
                    existing.timestamp,
                    Arc::new(existing),
                ));
            }
            let ts = self.clock.now();
            let mut table = mutation::decode_header(&parts, &header.cells, ts)?;
            for (mut column, position) in columns.iter().cloned().zip(0u32..) {
                column.position = position;
                table.columns.push(column);
            }
            if self.commit(&parts, None, snapshot_writes(&table), ts)? {
                debug!(
                    table = %table.full_name(),
                    columns = table.columns.len(),
                    "created table"
                );
                return Ok(MutationResult::with_table(MutationCode::TableNotFound, ts, Arc::new(table)));
            }
        }
        Err(self.contended(&parts, "create_table"))
    }

    fn drop_table(&self, mutations: &[Mutation], table_type: TableType) -> StrataResult<MutationResult> {
        let (_, parts, _) = split_header(mutations)?;
        for _ in 0..self.max_attempts() {
            let Some((current, raw)) = self.load_latest(&parts)? else {
                return Ok(MutationResult::new(MutationCode::TableNotFound, self.clock.now()));
            };
            if current.table_type != table_type {
                return Ok(MutationResult::new(MutationCode::TableNotFound, self.clock.now()));
            }
            if current.table_type == TableType::System {
                return Ok(MutationResult::with_table(
                    MutationCode::UnallowedTableMutation,
                    self.clock.now(),
                    Arc::new(current),
                ));
            }
            let ts = self.clock.now();
            let mut writes = vec![KvWrite::Delete {
                key: row_key::table_key(&parts.tenant, &parts.schema, &parts.table),
            }];
            writes.extend(current.columns.iter().map(|c| KvWrite::Delete {
                key: row_key::column_key(&parts.tenant, &parts.schema, &parts.table, &c.name, c.family_key()),
            }));
            if self.commit(&parts, Some(&raw[..]), writes, ts)? {
                debug!(table = %current.full_name(), "dropped table");
                return Ok(MutationResult::with_table(
                    MutationCode::TableAlreadyExists,
                    ts,
                    Arc::new(current),
                ));
            }
        }
        Err(self.contended(&parts, "drop_table"))
    }

    fn add_column(&self, mutations: &[Mutation]) -> StrataResult<MutationResult> {
        let (header, parts, rest) = split_header(mutations)?;
        let sequence_number = required_sequence_number(header)?;
        let immutable_rows = mutation::immutable_rows_cell(&header.cells)?;
        let mut columns = Vec::with_capacity(rest.len());
        for m in rest {
            if m.kind != MutationKind::Put {
                return Err(StrataError::invalid_argument("add column carries a column delete"));
            }
            columns.push(mutation::decode_column(&m.row_parts()?, &m.cells)?);
        }

        for _ in 0..self.max_attempts() {
            let Some((current, raw)) = self.load_latest(&parts)? else {
                return Ok(MutationResult::new(MutationCode::TableNotFound, self.clock.now()));
            };
            let current_ts = current.timestamp;
            if current.table_type == TableType::Index {
                return Ok(MutationResult::with_table(
                    MutationCode::UnallowedTableMutation,
                    current_ts,
                    Arc::new(current),
                ));
            }
            if sequence_number != current.sequence_number + 1 {
                return Ok(MutationResult::with_table(
                    MutationCode::ConcurrentTableMutation,
                    current_ts,
                    Arc::new(current),
                ));
            }
            if columns
                .iter()
                .any(|c| current.column(c.family.as_deref(), &c.name).is_some())
            {
                return Ok(MutationResult::with_table(
                    MutationCode::ColumnAlreadyExists,
                    current_ts,
                    Arc::new(current),
                ));
            }
            let ts = self.clock.now();
            let next = current.with_columns_added(
                columns.clone(),
                ts,
                sequence_number,
                immutable_rows.unwrap_or(current.immutable_rows),
            )?;
            if self.commit(&parts, Some(&raw[..]), snapshot_writes(&next), ts)? {
                debug!(
                    table = %next.full_name(),
                    seq = sequence_number,
                    added = columns.len(),
                    "added columns"
                );
                return Ok(MutationResult::with_table(MutationCode::TableAlreadyExists, ts, Arc::new(next)));
            }
        }
        Err(self.contended(&parts, "add_column"))
    }

    fn drop_column(&self, mutations: &[Mutation]) -> StrataResult<MutationResult> {
        let (header, parts, rest) = split_header(mutations)?;
        let sequence_number = required_sequence_number(header)?;
        let mut targets = Vec::new();
        for m in rest.iter().filter(|m| m.kind == MutationKind::Delete) {
            let column = m.row_parts()?;
            let family = column.family.filter(|f| !f.is_empty());
            let name = column
                .column
                .ok_or_else(|| StrataError::invalid_argument("not a column row"))?;
            targets.push((m.row.clone(), family, name));
        }

        for _ in 0..self.max_attempts() {
            let Some((current, raw)) = self.load_latest(&parts)? else {
                return Ok(MutationResult::new(MutationCode::TableNotFound, self.clock.now()));
            };
            let current_ts = current.timestamp;
            if sequence_number != current.sequence_number + 1 {
                return Ok(MutationResult::with_table(
                    MutationCode::ConcurrentTableMutation,
                    current_ts,
                    Arc::new(current),
                ));
            }
            if targets
                .iter()
                .any(|(_, family, name)| current.column(family.as_deref(), name).is_none())
            {
                return Ok(MutationResult::with_table(
                    MutationCode::ColumnNotFound,
                    current_ts,
                    Arc::new(current),
                ));
            }
            let ts = self.clock.now();
            let mut next = current.clone();
            for (_, family, name) in &targets {
                next = next.with_column_removed(family.as_deref(), name, ts, sequence_number)?;
            }
            next.sequence_number = sequence_number;
            next.timestamp = ts;

            let mut writes = snapshot_writes(&next);
            writes.extend(targets.iter().map(|(key, _, _)| KvWrite::Delete { key: key.clone() }));
            if self.commit(&parts, Some(&raw[..]), writes, ts)? {
                debug!(
                    table = %next.full_name(),
                    seq = sequence_number,
                    dropped = targets.len(),
                    "dropped columns"
                );
                return Ok(MutationResult::with_table(MutationCode::TableAlreadyExists, ts, Arc::new(next)));
            }
        }
        Err(self.contended(&parts, "drop_column"))
    }

    fn update_index_state(&self, mutations: &[Mutation], parent_table: &str) -> StrataResult<MutationResult> {
        let (header, parts, _) = split_header(mutations)?;
        let requested = mutation::index_state_cell(&header.cells)?
            .ok_or_else(|| StrataError::invalid_argument("index state change carries no INDEX_STATE"))?;

        for _ in 0..self.max_attempts() {
            let Some((current, raw)) = self.load_latest(&parts)? else {
                return Ok(MutationResult::new(MutationCode::TableNotFound, self.clock.now()));
            };
            let current_ts = current.timestamp;
            let wrong_parent = current
                .parent_name
                .as_deref()
                .is_some_and(|p| !parent_table.is_empty() && p != parent_table);
            let from_disabled = current.index_state == Some(IndexState::Disable) && blocked_after_disable(requested);
            if current.table_type != TableType::Index || wrong_parent || from_disabled {
                return Ok(MutationResult::with_table(
                    MutationCode::UnallowedTableMutation,
                    current_ts,
                    Arc::new(current),
                ));
            }
            if current.index_state == Some(requested.resolve()) {
                return Ok(MutationResult::with_table(
                    MutationCode::TableAlreadyExists,
                    current_ts,
                    Arc::new(current),
                ));
            }
            let ts = self.clock.now();
            let next = current.with_index_state(requested, ts);
            let writes = vec![KvWrite::Put {
                key: row_key::table_key(&parts.tenant, &parts.schema, &parts.table),
                value: mutation::encode_cells(&mutation::header_cells(&next)),
            }];
            if self.commit(&parts, Some(&raw[..]), writes, ts)? {
                debug!(
                    index = %next.full_name(),
                    from = ?current.index_state,
                    to = ?next.index_state,
                    "updated index state"
                );
                return Ok(MutationResult::with_table(MutationCode::TableAlreadyExists, ts, Arc::new(next)));
            }
        }
        Err(self.contended(&parts, "update_index_state"))
    }

    fn create_sequence(
        &self,
        key: &SequenceKey,
        start: i64,
        increment: i64,
        cache_size: u32,
        ts: Timestamp,
    ) -> StrataResult<()> {
        let cache_size = if cache_size == 0 {
            self.config.sequence.default_cache_size
        } else {
            cache_size
        };
        self.sequences.store().create(key, start, increment, cache_size, ts)
    }

    fn drop_sequence(&self, key: &SequenceKey, ts: Timestamp) -> StrataResult<()> {
        self.sequences.store().remove(key, ts)?;
        self.sequences.invalidate(key);
        Ok(())
    }

    fn reserve_sequence_values(&self, keys: &[SequenceKey], ts: Timestamp) -> Vec<StrataResult<SequenceBatch>> {
        keys.iter().map(|key| self.sequences.store().reserve(key, ts)).collect()
    }

    fn increment_sequence_values(&self, keys: &[SequenceKey], ts: Timestamp) -> Vec<StrataResult<i64>> {
        self.sequences.next_values(keys, ts)
    }

    fn current_sequence_value(&self, key: &SequenceKey) -> StrataResult<i64> {
        self.sequences.current_value(key)
    }

    fn return_sequence_values(&self, keys: &[SequenceKey], ts: Timestamp) {
        self.sequences.return_values(keys, ts)
    }

    fn return_reserved_values(&self, batches: &[SequenceBatch], ts: Timestamp) -> Vec<StrataResult<bool>> {
        batches
            .iter()
            .map(|batch| self.sequences.store().return_values(batch, ts))
            .collect()
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        feature.is_enabled(&self.config.features)
    }
}

//! Copy-on-write table cache.
//!
//! A [`MetadataStore`] maps full table names to snapshots. It is a value:
//! every update returns a new store and leaves the receiver untouched, so
//! a reader that cloned the store keeps a consistent view no matter what
//! writers install afterwards. Clones share the map through an `Arc`;
//! updates copy the map of `Arc`ed snapshots, not the snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_common::types::Timestamp;
use strata_common::{StrataError, StrataResult, DEFAULT_MAX_CACHED_TABLES};
use tracing::{debug, warn};

use crate::table::{ColumnDef, TableSnapshot};

/// Immutable map from full table name to table snapshot.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    tables: Arc<BTreeMap<String, Arc<TableSnapshot>>>,
    max_cached_tables: usize,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHED_TABLES)
    }
}

impl MetadataStore {
    /// An empty store that warns beyond `max_cached_tables` entries.
    pub fn new(max_cached_tables: usize) -> Self {
        Self {
            tables: Arc::new(BTreeMap::new()),
            max_cached_tables,
        }
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is cached.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a table by full name.
    pub fn find_table(&self, name: &str) -> Option<Arc<TableSnapshot>> {
        self.tables.get(name).cloned()
    }

    /// Looks up a table by full name, failing if absent.
    pub fn get_table(&self, name: &str) -> StrataResult<Arc<TableSnapshot>> {
        self.find_table(name).ok_or_else(|| StrataError::TableNotFound {
            table: name.to_string(),
        })
    }

    /// Cached tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableSnapshot>> {
        self.tables.values()
    }

    fn with_tables(&self, tables: BTreeMap<String, Arc<TableSnapshot>>) -> Self {
        if tables.len() > self.max_cached_tables {
            warn!(
                tables = tables.len(),
                limit = self.max_cached_tables,
                "metadata cache exceeds configured size"
            );
        }
        Self {
            tables: Arc::new(tables),
            max_cached_tables: self.max_cached_tables,
        }
    }

    /// Returns a store with `table` added or replaced.
    pub fn add_table(&self, table: TableSnapshot) -> Self {
        let mut tables = (*self.tables).clone();
        debug!(table = %table.full_name(), seq = table.sequence_number, "caching table");
        tables.insert(table.full_name(), Arc::new(table));
        self.with_tables(tables)
    }

    /// Returns a store where `name` has `columns` appended.
    ///
    /// Fails with `SchemaVersionConflict` unless `sequence_number` is newer
    /// than the cached table's.
    pub fn add_columns(
        &self,
        name: &str,
        columns: Vec<ColumnDef>,
        timestamp: Timestamp,
        sequence_number: u64,
        immutable_rows: bool,
    ) -> StrataResult<Self> {
        let current = self.get_table(name)?;
        check_newer(&current, sequence_number)?;
        let next = current.with_columns_added(columns, timestamp, sequence_number, immutable_rows)?;
        Ok(self.add_table(next))
    }

    /// Returns a store without `name`.
    pub fn remove_table(&self, name: &str) -> StrataResult<Self> {
        let mut tables = (*self.tables).clone();
        if tables.remove(name).is_none() {
            return Err(StrataError::TableNotFound {
                table: name.to_string(),
            });
        }
        Ok(self.with_tables(tables))
    }

    /// Returns a store where `name` no longer has the given column.
    pub fn remove_column(
        &self,
        name: &str,
        family: Option<&str>,
        column: &str,
        timestamp: Timestamp,
        sequence_number: u64,
    ) -> StrataResult<Self> {
        let current = self.get_table(name)?;
        check_newer(&current, sequence_number)?;
        let next = current.with_column_removed(family, column, timestamp, sequence_number)?;
        Ok(self.add_table(next))
    }
}

fn check_newer(current: &TableSnapshot, sequence_number: u64) -> StrataResult<()> {
    if sequence_number <= current.sequence_number {
        return Err(StrataError::SchemaVersionConflict {
            table: current.full_name(),
            expected: current.sequence_number + 1,
            actual: sequence_number,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_key::TenantId;
    use crate::table::TableType;
    use strata_types::LogicalType;

    fn table(name: &str) -> TableSnapshot {
        TableSnapshot::new(
            TenantId::global(),
            "",
            name,
            TableType::Table,
            0,
            Timestamp::from_micros(1),
            vec![ColumnDef::new("K", None, LogicalType::Integer)],
        )
    }

    #[test]
    fn test_updates_do_not_touch_old_store() {
        let empty = MetadataStore::default();
        let one = empty.add_table(table("A"));
        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);

        let widened = one
            .add_columns(
                "A",
                vec![ColumnDef::new("V", Some("0"), LogicalType::Varchar)],
                Timestamp::from_micros(2),
                1,
                false,
            )
            .unwrap();
        assert_eq!(one.get_table("A").unwrap().columns.len(), 1);
        assert_eq!(widened.get_table("A").unwrap().columns.len(), 2);

        let gone = widened.remove_table("A").unwrap();
        assert!(gone.find_table("A").is_none());
        assert!(widened.find_table("A").is_some());
    }

    #[test]
    fn test_stale_sequence_number_conflicts() {
        let store = MetadataStore::default().add_table(table("A"));
        let err = store
            .remove_column("A", None, "K", Timestamp::from_micros(2), 0)
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_table() {
        let store = MetadataStore::default();
        assert!(store.get_table("NOPE").is_err());
        assert!(store.remove_table("NOPE").is_err());
    }
}

//! Table snapshots.
//!
//! A [`TableSnapshot`] is never modified after construction. Schema
//! changes build a new snapshot with a higher sequence number; readers
//! holding the old one keep seeing it unchanged.

use std::fmt;

use strata_common::types::Timestamp;
use strata_common::{StrataError, StrataResult};
use strata_types::{LogicalType, SortOrder};

use crate::row_key::{full_table_name, TenantId};

/// Kind of table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableType {
    /// Catalog table.
    System,
    /// Regular table.
    Table,
    /// View over another table.
    View,
    /// Secondary index of another table.
    Index,
}

impl TableType {
    /// Catalog cell value.
    pub fn serialized(self) -> u8 {
        match self {
            TableType::System => b's',
            TableType::Table => b'u',
            TableType::View => b'v',
            TableType::Index => b'i',
        }
    }

    /// Parses a catalog cell value.
    pub fn from_serialized(value: u8) -> StrataResult<Self> {
        Ok(match value {
            b's' => TableType::System,
            b'u' => TableType::Table,
            b'v' => TableType::View,
            b'i' => TableType::Index,
            other => {
                return Err(StrataError::invalid_argument(format!(
                    "unknown table type {:?}",
                    char::from(other)
                )))
            }
        })
    }
}

/// Lifecycle state of a secondary index.
///
/// `Usable` and `Unusable` are requests; they resolve to `Active` and
/// `Inactive` when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexState {
    /// Being populated.
    Building,
    /// Request to make the index usable.
    Usable,
    /// Request to stop using the index.
    Unusable,
    /// Used by queries and maintained.
    Active,
    /// Maintained but not used by queries.
    Inactive,
    /// Neither used nor maintained.
    Disable,
    /// Being rebuilt from scratch.
    Rebuild,
}

impl IndexState {
    /// Catalog cell value.
    pub fn serialized(self) -> u8 {
        match self {
            IndexState::Building => b'b',
            IndexState::Usable => b'e',
            IndexState::Unusable => b'd',
            IndexState::Active => b'a',
            IndexState::Inactive => b'i',
            IndexState::Disable => b'x',
            IndexState::Rebuild => b'r',
        }
    }

    /// Parses a catalog cell value.
    pub fn from_serialized(value: u8) -> StrataResult<Self> {
        Ok(match value {
            b'b' => IndexState::Building,
            b'e' => IndexState::Usable,
            b'd' => IndexState::Unusable,
            b'a' => IndexState::Active,
            b'i' => IndexState::Inactive,
            b'x' => IndexState::Disable,
            b'r' => IndexState::Rebuild,
            other => {
                return Err(StrataError::invalid_argument(format!(
                    "unknown index state {:?}",
                    char::from(other)
                )))
            }
        })
    }

    /// The state actually stored when this one is requested.
    pub fn resolve(self) -> Self {
        match self {
            IndexState::Usable => IndexState::Active,
            IndexState::Unusable => IndexState::Inactive,
            other => other,
        }
    }
}

/// Definition of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column family, `None` for primary-key columns.
    pub family: Option<String>,
    /// Logical type.
    pub data_type: LogicalType,
    /// Storage order.
    pub sort_order: SortOrder,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Zero-based position in the table.
    pub position: u32,
    /// Maximum length (CHAR/BINARY) or precision (DECIMAL).
    pub max_length: Option<u32>,
    /// Scale (DECIMAL).
    pub scale: Option<u32>,
}

impl ColumnDef {
    /// Creates a nullable ascending column. The position is assigned when
    /// the column is added to a table.
    pub fn new(name: impl Into<String>, family: Option<&str>, data_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            family: family.map(str::to_string),
            data_type,
            sort_order: SortOrder::Asc,
            nullable: true,
            position: 0,
            max_length: None,
            scale: None,
        }
    }

    /// Sets the storage order.
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Disallows NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the maximum length or precision and the scale.
    pub fn with_length(mut self, max_length: u32, scale: Option<u32>) -> Self {
        self.max_length = Some(max_length);
        self.scale = scale;
        self
    }

    /// Family name as stored in row keys, empty for primary-key columns.
    pub fn family_key(&self) -> &str {
        self.family.as_deref().unwrap_or("")
    }

    fn same_column(&self, family: Option<&str>, name: &str) -> bool {
        self.name == name && self.family.as_deref() == family
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(family) = &self.family {
            write!(f, "{family}.")?;
        }
        write!(f, "{} {}", self.name, self.data_type)
    }
}

/// Immutable metadata of one table at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    /// Owning tenant.
    pub tenant: TenantId,
    /// Schema name, empty for the default schema.
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Kind of table.
    pub table_type: TableType,
    /// Bumped by every column change.
    pub sequence_number: u64,
    /// When this version became effective.
    pub timestamp: Timestamp,
    /// Columns ordered by position.
    pub columns: Vec<ColumnDef>,
    /// State, for indexes.
    pub index_state: Option<IndexState>,
    /// Indexed or viewed table, for indexes and views.
    pub parent_name: Option<String>,
    /// Rows are never updated in place.
    pub immutable_rows: bool,
}

impl TableSnapshot {
    /// Creates a table at `sequence_number` with the given columns,
    /// numbering their positions in order.
    pub fn new(
        tenant: TenantId,
        schema: impl Into<String>,
        name: impl Into<String>,
        table_type: TableType,
        sequence_number: u64,
        timestamp: Timestamp,
        columns: Vec<ColumnDef>,
    ) -> Self {
        let columns = columns
            .into_iter()
            .zip(0u32..)
            .map(|(mut c, position)| {
                c.position = position;
                c
            })
            .collect();
        Self {
            tenant,
            schema: schema.into(),
            name: name.into(),
            table_type,
            sequence_number,
            timestamp,
            columns,
            index_state: (table_type == TableType::Index).then_some(IndexState::Building),
            parent_name: None,
            immutable_rows: false,
        }
    }

    /// Sets the parent table.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_name = Some(parent.into());
        self
    }

    /// `SCHEMA.TABLE`, or `TABLE` in the default schema.
    pub fn full_name(&self) -> String {
        full_table_name(&self.schema, &self.name)
    }

    /// Looks up a column.
    pub fn column(&self, family: Option<&str>, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.same_column(family, name))
    }

    /// Returns a copy with `columns` appended after the existing ones.
    pub fn with_columns_added(
        &self,
        columns: Vec<ColumnDef>,
        timestamp: Timestamp,
        sequence_number: u64,
        immutable_rows: bool,
    ) -> StrataResult<Self> {
        let mut next = self.clone();
        for mut column in columns {
            if next.column(column.family.as_deref(), &column.name).is_some() {
                return Err(StrataError::invalid_argument(format!(
                    "column {column} already exists in {}",
                    self.full_name()
                )));
            }
            column.position = u32::try_from(next.columns.len())
                .map_err(|_| StrataError::internal("too many columns"))?;
            next.columns.push(column);
        }
        next.timestamp = timestamp;
        next.sequence_number = sequence_number;
        next.immutable_rows = immutable_rows;
        Ok(next)
    }

    /// Returns a copy without the named column; later positions shift down.
    pub fn with_column_removed(
        &self,
        family: Option<&str>,
        name: &str,
        timestamp: Timestamp,
        sequence_number: u64,
    ) -> StrataResult<Self> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.same_column(family, name))
            .ok_or_else(|| {
                StrataError::invalid_argument(format!(
                    "column {name} not found in {}",
                    self.full_name()
                ))
            })?;
        let mut next = self.clone();
        next.columns.remove(idx);
        for (column, position) in next.columns.iter_mut().zip(0u32..) {
            column.position = position;
        }
        next.timestamp = timestamp;
        next.sequence_number = sequence_number;
        Ok(next)
    }

    /// Returns a copy in index state `state`, resolved.
    pub fn with_index_state(&self, state: IndexState, timestamp: Timestamp) -> Self {
        let mut next = self.clone();
        next.index_state = Some(state.resolve());
        next.timestamp = timestamp;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TableSnapshot {
        TableSnapshot::new(
            TenantId::global(),
            "APP",
            "ORDERS",
            TableType::Table,
            0,
            Timestamp::from_micros(1),
            vec![
                ColumnDef::new("ID", None, LogicalType::BigInt).not_null(),
                ColumnDef::new("TOTAL", Some("0"), LogicalType::Decimal),
            ],
        )
    }

    #[test]
    fn test_positions_assigned() {
        let t = orders();
        assert_eq!(t.columns[1].position, 1);
        assert_eq!(t.full_name(), "APP.ORDERS");
        assert!(t.index_state.is_none());
    }

    #[test]
    fn test_add_and_remove_columns() {
        let t = orders();
        let added = t
            .with_columns_added(
                vec![ColumnDef::new("NOTE", Some("0"), LogicalType::Varchar)],
                Timestamp::from_micros(2),
                1,
                false,
            )
            .unwrap();
        assert_eq!(added.columns.len(), 3);
        assert_eq!(added.column(Some("0"), "NOTE").unwrap().position, 2);
        // the original is untouched
        assert_eq!(t.columns.len(), 2);

        let removed = added
            .with_column_removed(Some("0"), "TOTAL", Timestamp::from_micros(3), 2)
            .unwrap();
        assert_eq!(removed.column(Some("0"), "NOTE").unwrap().position, 1);
        assert!(removed.with_column_removed(None, "NOPE", Timestamp::ZERO, 3).is_err());
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let dup = vec![ColumnDef::new("TOTAL", Some("0"), LogicalType::Integer)];
        assert!(orders().with_columns_added(dup, Timestamp::ZERO, 1, false).is_err());
    }

    #[test]
    fn test_index_state_resolution() {
        assert_eq!(IndexState::Usable.resolve(), IndexState::Active);
        assert_eq!(IndexState::Unusable.resolve(), IndexState::Inactive);
        assert_eq!(IndexState::Rebuild.resolve(), IndexState::Rebuild);
        for state in [IndexState::Building, IndexState::Active, IndexState::Disable] {
            assert_eq!(IndexState::from_serialized(state.serialized()).unwrap(), state);
        }
        assert!(TableType::from_serialized(b'?').is_err());
    }
}

//! Outcome of catalog operations.

use std::fmt;
use std::sync::Arc;

use strata_common::types::Timestamp;

use crate::table::TableSnapshot;

/// What a catalog operation found or did.
///
/// The codes describe the table's state as the server saw it: a
/// successful create reports `TableNotFound` (there was no table), a
/// successful drop or column change reports `TableAlreadyExists`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationCode {
    /// The table exists; for reads, the caller's copy is current.
    TableAlreadyExists,
    /// No such table.
    TableNotFound,
    /// The caller's copy is stale; the result carries the newer one.
    NewerTableFound,
    /// A column being added already exists.
    ColumnAlreadyExists,
    /// A column being dropped does not exist.
    ColumnNotFound,
    /// Another writer changed the table first.
    ConcurrentTableMutation,
    /// The change is not allowed for this kind of table.
    UnallowedTableMutation,
}

impl fmt::Display for MutationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationCode::TableAlreadyExists => "TABLE_ALREADY_EXISTS",
            MutationCode::TableNotFound => "TABLE_NOT_FOUND",
            MutationCode::NewerTableFound => "NEWER_TABLE_FOUND",
            MutationCode::ColumnAlreadyExists => "COLUMN_ALREADY_EXISTS",
            MutationCode::ColumnNotFound => "COLUMN_NOT_FOUND",
            MutationCode::ConcurrentTableMutation => "CONCURRENT_TABLE_MUTATION",
            MutationCode::UnallowedTableMutation => "UNALLOWED_TABLE_MUTATION",
        };
        f.write_str(name)
    }
}

/// Result of a catalog read or mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    /// Outcome.
    pub code: MutationCode,
    /// Server time of the read or write.
    pub mutation_time: Timestamp,
    /// Table state to install, when the caller needs one.
    pub table: Option<Arc<TableSnapshot>>,
}

impl MutationResult {
    /// A result without a table.
    pub fn new(code: MutationCode, mutation_time: Timestamp) -> Self {
        Self {
            code,
            mutation_time,
            table: None,
        }
    }

    /// A result carrying `table`.
    pub fn with_table(code: MutationCode, mutation_time: Timestamp, table: Arc<TableSnapshot>) -> Self {
        Self {
            code,
            mutation_time,
            table: Some(table),
        }
    }
}

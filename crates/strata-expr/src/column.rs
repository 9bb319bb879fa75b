//! Column reference node.

use std::fmt;

use strata_types::{EncodedValue, LogicalType, SortOrder};

use crate::row::RowSource;

/// Reads one column of the row being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpression {
    position: usize,
    data_type: LogicalType,
    sort_order: SortOrder,
    name: Option<String>,
}

impl ColumnExpression {
    /// Creates an ascending column reference.
    pub fn new(position: usize, data_type: LogicalType) -> Self {
        Self {
            position,
            data_type,
            sort_order: SortOrder::Asc,
            name: None,
        }
    }

    /// Sets the storage order of the column.
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Position of the column in the row.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Column type.
    pub fn data_type(&self) -> LogicalType {
        self.data_type
    }

    /// Column storage order.
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        row.value(self.position)
    }
}

impl fmt::Display for ColumnExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "${}", self.position),
        }
    }
}

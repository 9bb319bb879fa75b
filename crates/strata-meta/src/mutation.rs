//! Row-level schema mutations.
//!
//! A schema change travels as a list of [`Mutation`]s against catalog
//! rows: the table header row first, then one row per affected column.
//! Each row holds a small property map ("cells"). The same map, encoded
//! by [`encode_cells`], is what the key-value store keeps for the row.

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use strata_common::types::{Key, Timestamp};
use strata_common::{StrataError, StrataResult, TABLE_FAMILY};
use strata_types::{LogicalType, SortOrder};

use crate::row_key::{self, RowKeyParts, TenantId};
use crate::table::{ColumnDef, IndexState, TableSnapshot, TableType};

/// Cell names of catalog rows.
pub mod cells {
    /// Table type, one byte.
    pub const TABLE_TYPE: &str = "TABLE_TYPE";
    /// Table sequence number, big-endian u64.
    pub const TABLE_SEQ_NUM: &str = "TABLE_SEQ_NUM";
    /// Index state, one byte.
    pub const INDEX_STATE: &str = "INDEX_STATE";
    /// Parent table name, UTF-8.
    pub const PARENT_NAME: &str = "PARENT_NAME";
    /// Immutable-rows flag, one byte.
    pub const IMMUTABLE_ROWS: &str = "IMMUTABLE_ROWS";
    /// Logical type id, one byte.
    pub const DATA_TYPE: &str = "DATA_TYPE";
    /// Sort order, one byte.
    pub const SORT_ORDER: &str = "SORT_ORDER";
    /// Nullable flag, one byte.
    pub const NULLABLE: &str = "NULLABLE";
    /// Column position, big-endian u32.
    pub const ORDINAL_POSITION: &str = "ORDINAL_POSITION";
    /// Maximum length or precision, big-endian u32.
    pub const MAX_LENGTH: &str = "MAX_LENGTH";
    /// Decimal scale, big-endian u32.
    pub const SCALE: &str = "SCALE";
}

/// Whether a mutation writes or removes its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Writes the cells.
    Put,
    /// Removes the row.
    Delete,
}

/// A change to one catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Catalog row key.
    pub row: Key,
    /// Column family of the cells.
    pub family: Bytes,
    /// Put or delete.
    pub kind: MutationKind,
    /// Property cells, empty for deletes.
    pub cells: BTreeMap<String, Bytes>,
}

impl Mutation {
    /// Writes `cells` to `row`.
    pub fn put(row: Key, cells: BTreeMap<String, Bytes>) -> Self {
        Self {
            row,
            family: Bytes::from_static(TABLE_FAMILY),
            kind: MutationKind::Put,
            cells,
        }
    }

    /// Removes `row`.
    pub fn delete(row: Key) -> Self {
        Self {
            row,
            family: Bytes::from_static(TABLE_FAMILY),
            kind: MutationKind::Delete,
            cells: BTreeMap::new(),
        }
    }

    /// Splits the row key.
    pub fn row_parts(&self) -> StrataResult<RowKeyParts> {
        row_key::split(&self.row)
    }

    /// A cell value.
    pub fn cell(&self, name: &str) -> Option<&Bytes> {
        self.cells.get(name)
    }
}

/// Builds the mutation lists for schema changes of one table.
#[derive(Debug, Clone)]
pub struct TableMutationBuilder {
    tenant: TenantId,
    schema: String,
    table: String,
}

impl TableMutationBuilder {
    /// Creates a builder for `schema.table` of `tenant`.
    pub fn new(tenant: TenantId, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            tenant,
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Creates a builder for the table of `snapshot`.
    pub fn for_table(snapshot: &TableSnapshot) -> Self {
        Self::new(snapshot.tenant.clone(), &snapshot.schema, &snapshot.name)
    }

    fn header_key(&self) -> Key {
        row_key::table_key(&self.tenant, &self.schema, &self.table)
    }

    fn column_key(&self, column: &ColumnDef) -> Key {
        row_key::column_key(&self.tenant, &self.schema, &self.table, &column.name, column.family_key())
    }

    /// Header row plus one row per column.
    pub fn create_table(&self, table: &TableSnapshot) -> Vec<Mutation> {
        let mut mutations = vec![Mutation::put(self.header_key(), header_cells(table))];
        mutations.extend(
            table
                .columns
                .iter()
                .map(|c| Mutation::put(self.column_key(c), column_cells(c))),
        );
        mutations
    }

    /// Header row carrying the new sequence number, plus the new columns.
    pub fn add_columns(&self, sequence_number: u64, immutable_rows: bool, columns: &[ColumnDef]) -> Vec<Mutation> {
        let mut header = BTreeMap::new();
        header.insert(cells::TABLE_SEQ_NUM.to_string(), u64_cell(sequence_number));
        header.insert(cells::IMMUTABLE_ROWS.to_string(), bool_cell(immutable_rows));
        let mut mutations = vec![Mutation::put(self.header_key(), header)];
        mutations.extend(
            columns
                .iter()
                .map(|c| Mutation::put(self.column_key(c), column_cells(c))),
        );
        mutations
    }

    /// Header row carrying the new sequence number, plus a column delete.
    pub fn drop_column(&self, sequence_number: u64, family: Option<&str>, column: &str) -> Vec<Mutation> {
        let mut header = BTreeMap::new();
        header.insert(cells::TABLE_SEQ_NUM.to_string(), u64_cell(sequence_number));
        let key = row_key::column_key(
            &self.tenant,
            &self.schema,
            &self.table,
            column,
            family.unwrap_or(""),
        );
        vec![Mutation::put(self.header_key(), header), Mutation::delete(key)]
    }

    /// Header delete. Column rows go with it.
    pub fn drop_table(&self) -> Vec<Mutation> {
        vec![Mutation::delete(self.header_key())]
    }

    /// Header row carrying the requested index state.
    pub fn update_index_state(&self, state: IndexState) -> Vec<Mutation> {
        let mut header = BTreeMap::new();
        header.insert(cells::INDEX_STATE.to_string(), Bytes::copy_from_slice(&[state.serialized()]));
        vec![Mutation::put(self.header_key(), header)]
    }
}

fn u64_cell(v: u64) -> Bytes {
    Bytes::copy_from_slice(&v.to_be_bytes())
}

fn u32_cell(v: u32) -> Bytes {
    Bytes::copy_from_slice(&v.to_be_bytes())
}

fn bool_cell(v: bool) -> Bytes {
    Bytes::copy_from_slice(&[u8::from(v)])
}

/// Cells of a table header row.
pub(crate) fn header_cells(table: &TableSnapshot) -> BTreeMap<String, Bytes> {
    let mut cells = BTreeMap::new();
    cells.insert(cells::TABLE_TYPE.to_string(), Bytes::copy_from_slice(&[table.table_type.serialized()]));
    cells.insert(cells::TABLE_SEQ_NUM.to_string(), u64_cell(table.sequence_number));
    cells.insert(cells::IMMUTABLE_ROWS.to_string(), bool_cell(table.immutable_rows));
    if let Some(state) = table.index_state {
        cells.insert(cells::INDEX_STATE.to_string(), Bytes::copy_from_slice(&[state.serialized()]));
    }
    if let Some(parent) = &table.parent_name {
        cells.insert(cells::PARENT_NAME.to_string(), Bytes::copy_from_slice(parent.as_bytes()));
    }
    cells
}

/// Cells of a column row.
pub(crate) fn column_cells(column: &ColumnDef) -> BTreeMap<String, Bytes> {
    let mut cells = BTreeMap::new();
    cells.insert(cells::DATA_TYPE.to_string(), Bytes::copy_from_slice(&[column.data_type.type_id()]));
    cells.insert(
        cells::SORT_ORDER.to_string(),
        Bytes::copy_from_slice(&[column.sort_order.system_value()]),
    );
    cells.insert(cells::NULLABLE.to_string(), bool_cell(column.nullable));
    cells.insert(cells::ORDINAL_POSITION.to_string(), u32_cell(column.position));
    if let Some(len) = column.max_length {
        cells.insert(cells::MAX_LENGTH.to_string(), u32_cell(len));
    }
    if let Some(scale) = column.scale {
        cells.insert(cells::SCALE.to_string(), u32_cell(scale));
    }
    cells
}

fn required<'a>(cells: &'a BTreeMap<String, Bytes>, name: &str) -> StrataResult<&'a Bytes> {
    cells
        .get(name)
        .ok_or_else(|| StrataError::invalid_argument(format!("catalog row is missing cell {name}")))
}

fn byte_cell(cells: &BTreeMap<String, Bytes>, name: &str) -> StrataResult<Option<u8>> {
    match cells.get(name) {
        None => Ok(None),
        Some(v) if v.len() == 1 => Ok(Some(v[0])),
        Some(v) => Err(StrataError::invalid_argument(format!(
            "cell {name} has {} bytes, expected 1",
            v.len()
        ))),
    }
}

fn fixed_cell<const N: usize>(cells: &BTreeMap<String, Bytes>, name: &str) -> StrataResult<Option<[u8; N]>> {
    cells
        .get(name)
        .map(|v| {
            <[u8; N]>::try_from(v.as_ref()).map_err(|_| {
                StrataError::invalid_argument(format!("cell {name} has {} bytes, expected {N}", v.len()))
            })
        })
        .transpose()
}

/// Sequence number carried by a header mutation, if any.
pub(crate) fn sequence_number_cell(cells: &BTreeMap<String, Bytes>) -> StrataResult<Option<u64>> {
    Ok(fixed_cell::<8>(cells, cells::TABLE_SEQ_NUM)?.map(u64::from_be_bytes))
}

/// Immutable-rows flag carried by a header mutation, if any.
pub(crate) fn immutable_rows_cell(cells: &BTreeMap<String, Bytes>) -> StrataResult<Option<bool>> {
    Ok(byte_cell(cells, cells::IMMUTABLE_ROWS)?.map(|b| b != 0))
}

/// Index state carried by a header mutation, if any.
pub(crate) fn index_state_cell(cells: &BTreeMap<String, Bytes>) -> StrataResult<Option<IndexState>> {
    byte_cell(cells, cells::INDEX_STATE)?
        .map(IndexState::from_serialized)
        .transpose()
}

/// Rebuilds a table header (without columns) from its row.
pub(crate) fn decode_header(
    parts: &RowKeyParts,
    cells: &BTreeMap<String, Bytes>,
    timestamp: Timestamp,
) -> StrataResult<TableSnapshot> {
    let type_byte = required(cells, cells::TABLE_TYPE)?;
    let table_type = match type_byte.as_ref() {
        [b] => TableType::from_serialized(*b)?,
        _ => return Err(StrataError::invalid_argument("malformed TABLE_TYPE cell")),
    };
    let sequence_number = sequence_number_cell(cells)?
        .ok_or_else(|| StrataError::invalid_argument("catalog row is missing TABLE_SEQ_NUM"))?;
    let parent_name = cells
        .get(cells::PARENT_NAME)
        .map(|v| {
            String::from_utf8(v.to_vec())
                .map_err(|e| StrataError::invalid_argument(format!("PARENT_NAME: {e}")))
        })
        .transpose()?;
    let mut table = TableSnapshot::new(
        parts.tenant.clone(),
        parts.schema.clone(),
        parts.table.clone(),
        table_type,
        sequence_number,
        timestamp,
        Vec::new(),
    );
    if let Some(state) = index_state_cell(cells)? {
        table.index_state = Some(state);
    }
    table.parent_name = parent_name;
    table.immutable_rows = immutable_rows_cell(cells)?.unwrap_or(false);
    Ok(table)
}

/// Rebuilds a column definition from its row.
pub(crate) fn decode_column(parts: &RowKeyParts, cells: &BTreeMap<String, Bytes>) -> StrataResult<ColumnDef> {
    let name = parts
        .column
        .clone()
        .ok_or_else(|| StrataError::invalid_argument("not a column row"))?;
    let family = parts.family.clone().filter(|f| !f.is_empty());
    let type_id = byte_cell(cells, cells::DATA_TYPE)?
        .ok_or_else(|| StrataError::invalid_argument(format!("column {name} has no DATA_TYPE")))?;
    let data_type = LogicalType::from_type_id(type_id)
        .ok_or_else(|| StrataError::invalid_argument(format!("unknown type id {type_id}")))?;
    let sort_order = match byte_cell(cells, cells::SORT_ORDER)? {
        Some(v) => SortOrder::from_system_value(v)?,
        None => SortOrder::Asc,
    };
    Ok(ColumnDef {
        name,
        family,
        data_type,
        sort_order,
        nullable: byte_cell(cells, cells::NULLABLE)?.map_or(true, |b| b != 0),
        position: fixed_cell::<4>(cells, cells::ORDINAL_POSITION)?.map_or(0, u32::from_be_bytes),
        max_length: fixed_cell::<4>(cells, cells::MAX_LENGTH)?.map(u32::from_be_bytes),
        scale: fixed_cell::<4>(cells, cells::SCALE)?.map(u32::from_be_bytes),
    })
}

/// Encodes a cell map as a stored row value.
pub(crate) fn encode_cells(cells: &BTreeMap<String, Bytes>) -> Bytes {
    let size = 4 + cells.iter().map(|(k, v)| 2 + k.len() + 4 + v.len()).sum::<usize>();
    let mut buf = BytesMut::with_capacity(size);
    buf.put_u32(cells.len() as u32);
    for (name, value) in cells {
        buf.put_u16(name.len() as u16);
        buf.extend_from_slice(name.as_bytes());
        buf.put_u32(value.len() as u32);
        buf.extend_from_slice(value);
    }
    buf.freeze()
}

/// Decodes a stored row value.
pub(crate) fn decode_cells(bytes: &[u8]) -> StrataResult<BTreeMap<String, Bytes>> {
    let mut buf = bytes;
    let truncated = || StrataError::invalid_argument("catalog row value truncated");
    if buf.remaining() < 4 {
        return Err(truncated());
    }
    let count = buf.get_u32();
    let mut cells = BTreeMap::new();
    for _ in 0..count {
        if buf.remaining() < 2 {
            return Err(truncated());
        }
        let name_len = buf.get_u16() as usize;
        if buf.remaining() < name_len + 4 {
            return Err(truncated());
        }
        let name = String::from_utf8(buf[..name_len].to_vec())
            .map_err(|e| StrataError::invalid_argument(format!("cell name: {e}")))?;
        buf.advance(name_len);
        let value_len = buf.get_u32() as usize;
        if buf.remaining() < value_len {
            return Err(truncated());
        }
        let value = Bytes::copy_from_slice(&buf[..value_len]);
        buf.advance(value_len);
        cells.insert(name, value);
    }
    Ok(cells)
}

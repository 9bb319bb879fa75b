//! Catalog row keys.
//!
//! Table header rows are keyed `tenant 0x00 schema 0x00 table`; column
//! rows extend that with `0x00 column 0x00 family`. An empty family names
//! a primary-key column. Components must not contain the `0x00` separator.

use std::fmt;

use bytes::Bytes;
use strata_common::types::Key;
use strata_common::{StrataError, StrataResult, SEPARATOR_BYTE};

/// Opaque tenant identifier. The empty id is the global tenant.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TenantId(Bytes);

impl TenantId {
    /// The global (non-tenant) scope.
    pub fn global() -> Self {
        Self(Bytes::new())
    }

    /// Creates a tenant id from raw bytes.
    pub fn new(id: impl Into<Bytes>) -> Self {
        Self(id.into())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true for the global scope.
    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Components of a catalog row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKeyParts {
    /// Owning tenant.
    pub tenant: TenantId,
    /// Schema name, empty for the default schema.
    pub schema: String,
    /// Table name.
    pub table: String,
    /// Column name, for column rows.
    pub column: Option<String>,
    /// Column family, for column rows. Empty for primary-key columns.
    pub family: Option<String>,
}

impl RowKeyParts {
    /// Returns true if this names a table header row.
    pub fn is_table_row(&self) -> bool {
        self.column.is_none()
    }

    /// `SCHEMA.TABLE`, or `TABLE` in the default schema.
    pub fn full_table_name(&self) -> String {
        full_table_name(&self.schema, &self.table)
    }
}

/// `SCHEMA.TABLE`, or `TABLE` in the default schema.
pub fn full_table_name(schema: &str, table: &str) -> String {
    if schema.is_empty() {
        table.to_string()
    } else {
        format!("{schema}.{table}")
    }
}

fn join(parts: &[&[u8]]) -> Key {
    let len = parts.iter().map(|p| p.len() + 1).sum::<usize>();
    let mut buf = Vec::with_capacity(len);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            buf.push(SEPARATOR_BYTE);
        }
        buf.extend_from_slice(part);
    }
    Key::from_vec(buf)
}

/// Key of a table header row.
pub fn table_key(tenant: &TenantId, schema: &str, table: &str) -> Key {
    join(&[tenant.as_bytes(), schema.as_bytes(), table.as_bytes()])
}

/// Key of a column row.
pub fn column_key(tenant: &TenantId, schema: &str, table: &str, column: &str, family: &str) -> Key {
    join(&[
        tenant.as_bytes(),
        schema.as_bytes(),
        table.as_bytes(),
        column.as_bytes(),
        family.as_bytes(),
    ])
}

/// Prefix shared by every column row of a table.
pub fn column_prefix(tenant: &TenantId, schema: &str, table: &str) -> Key {
    let mut buf = table_key(tenant, schema, table).as_bytes().to_vec();
    buf.push(SEPARATOR_BYTE);
    Key::from_vec(buf)
}

/// Splits a catalog row key into its components.
pub fn split(key: &[u8]) -> StrataResult<RowKeyParts> {
    let parts: Vec<&[u8]> = key.split(|b| *b == SEPARATOR_BYTE).collect();
    let text = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StrataError::invalid_argument(format!("catalog row key is not UTF-8: {e}")))
    };
    match parts.as_slice() {
        [tenant, schema, table] => Ok(RowKeyParts {
            tenant: TenantId::new(Bytes::copy_from_slice(tenant)),
            schema: text(schema)?,
            table: text(table)?,
            column: None,
            family: None,
        }),
        [tenant, schema, table, column, family] => Ok(RowKeyParts {
            tenant: TenantId::new(Bytes::copy_from_slice(tenant)),
            schema: text(schema)?,
            table: text(table)?,
            column: Some(text(column)?),
            family: Some(text(family)?),
        }),
        _ => Err(StrataError::invalid_argument(format!(
            "malformed catalog row key {:?}",
            Key::from_bytes(key)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_key_layout() {
        let key = table_key(&TenantId::new("t1"), "APP", "ORDERS");
        assert_eq!(key.as_bytes(), b"t1\0APP\0ORDERS");
        let parts = split(&key).unwrap();
        assert!(parts.is_table_row());
        assert_eq!(parts.tenant, TenantId::new("t1"));
        assert_eq!(parts.full_table_name(), "APP.ORDERS");
    }

    #[test]
    fn test_column_key_round_trip() {
        let key = column_key(&TenantId::global(), "", "T", "V", "0");
        let parts = split(&key).unwrap();
        assert_eq!(parts.column.as_deref(), Some("V"));
        assert_eq!(parts.family.as_deref(), Some("0"));
        assert_eq!(parts.full_table_name(), "T");
        assert!(key.starts_with(column_prefix(&TenantId::global(), "", "T").as_bytes()));
    }

    #[test]
    fn test_malformed_keys() {
        assert!(split(b"only\0two").is_err());
        assert!(split(b"a\0b\0c\0d").is_err());
    }
}

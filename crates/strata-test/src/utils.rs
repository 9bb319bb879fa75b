use std::sync::{Arc, Once};

use strata_common::config::EngineConfig;
use strata_common::types::{ManualClock, Timestamp};
use strata_expr::row::EncodedRow;
use strata_expr::{ColumnExpression, Expression, LiteralExpression};
use strata_meta::{ColumnDef, MemoryKvStore, QueryServices, TableSnapshot, TableType, TenantId};
use strata_types::{codec, Datum, EncodedValue, LogicalType};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test subscriber once per process. `RUST_LOG` overrides the
/// default `warn` level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Services over a fresh in-memory store with a manual clock at 1000us.
pub fn manual_services(config: EngineConfig) -> (Arc<QueryServices>, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(Timestamp::from_micros(1_000)));
    let services = QueryServices::new(Arc::new(MemoryKvStore::new()), clock.clone(), config)
        .expect("test config is valid");
    (Arc::new(services), clock)
}

/// Integer column at `position`.
pub fn int_column(position: usize) -> Expression {
    Expression::Column(ColumnExpression::new(position, LogicalType::Integer).with_name(format!("C{position}")))
}

/// Integer literal.
pub fn int_literal(v: i32) -> Expression {
    Expression::Literal(LiteralExpression::from_datum(&Datum::Integer(v)).expect("integer literal"))
}

/// Integer NULL literal.
pub fn null_literal() -> Expression {
    Expression::Literal(LiteralExpression::null(LogicalType::Integer))
}

/// Ascending encoding of an integer.
pub fn encode_int(v: i32) -> EncodedValue {
    codec::encode(LogicalType::Integer, &Datum::Integer(v)).expect("integer encodes")
}

/// A row of integer columns; `None` is NULL.
pub fn int_row(values: &[Option<i32>]) -> EncodedRow {
    let encoded: Vec<EncodedValue> = values
        .iter()
        .map(|v| v.map_or_else(EncodedValue::null, encode_int))
        .collect();
    let spans: Vec<&[u8]> = encoded.iter().map(EncodedValue::as_bytes).collect();
    EncodedRow::from_values(&spans)
}

/// `APP.ORDERS (ID BIGINT NOT NULL, 0.NOTE VARCHAR)` at `sequence_number`.
pub fn orders_table(sequence_number: u64) -> TableSnapshot {
    TableSnapshot::new(
        TenantId::global(),
        "APP",
        "ORDERS",
        TableType::Table,
        sequence_number,
        Timestamp::ZERO,
        vec![
            ColumnDef::new("ID", None, LogicalType::BigInt).not_null(),
            ColumnDef::new("NOTE", Some("0"), LogicalType::Varchar),
        ],
    )
}

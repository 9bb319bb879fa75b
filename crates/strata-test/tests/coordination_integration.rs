//! Catalog and sequence coordination with concurrent callers.

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::{Arc, Barrier};
use std::thread;

use strata_common::config::EngineConfig;
use strata_common::types::{SystemClock, Timestamp, TimestampSource};
use strata_common::StrataError;
use strata_meta::{
    ColumnDef, CoordinationService, MemoryKvStore, MutationCode, QueryServices, SequenceKey, TableMutationBuilder,
    TenantId,
};
use strata_test::utils::{init_tracing, manual_services, orders_table};
use strata_types::LogicalType;

fn orders_builder() -> TableMutationBuilder {
    TableMutationBuilder::new(TenantId::global(), "APP", "ORDERS")
}

#[test]
fn sequence_batches_are_contiguous() {
    let (services, _) = manual_services(EngineConfig::for_testing());
    let key = SequenceKey::new(TenantId::global(), "APP", "IDS");
    let ts = services.now();
    services.create_sequence(&key, 1, 1, 10, ts).unwrap();

    let first = services.reserve_sequence_values(&[key.clone()], ts).remove(0).unwrap();
    let second = services.reserve_sequence_values(&[key.clone()], ts).remove(0).unwrap();
    assert_eq!(first.values().collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
    assert_eq!(second.values().collect::<Vec<_>>(), (11..=20).collect::<Vec<_>>());

    let again = services.create_sequence(&key, 1, 1, 10, ts);
    assert!(matches!(again, Err(StrataError::SequenceAlreadyExists { .. })));
}

#[test]
fn aborted_reservation_is_reused() {
    let (services, _) = manual_services(EngineConfig::for_testing());
    let key = SequenceKey::new(TenantId::global(), "APP", "IDS");
    let ts = services.now();
    services.create_sequence(&key, 1, 1, 10, ts).unwrap();

    let reserved = services.reserve_sequence_values(&[key.clone()], ts).remove(0).unwrap();
    assert_eq!(reserved.first, 1);
    let returned = services.return_reserved_values(&[reserved], ts);
    assert!(matches!(returned[..], [Ok(true)]));

    let next = services.reserve_sequence_values(&[key], ts).remove(0).unwrap();
    assert_eq!(next.values().collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
}

#[test]
fn concurrent_clients_never_share_values() {
    init_tracing();
    let store = Arc::new(MemoryKvStore::new());
    let mut config = EngineConfig::for_testing();
    config.sequence.max_cas_attempts = 1_000;
    let clients: Vec<Arc<QueryServices>> = (0..4)
        .map(|_| {
            Arc::new(QueryServices::new(store.clone(), Arc::new(SystemClock::new()), config.clone()).unwrap())
        })
        .collect();
    let key = SequenceKey::new(TenantId::global(), "APP", "IDS");
    let ts = clients[0].now();
    clients[0].create_sequence(&key, 1, 1, 7, ts).unwrap();

    let barrier = Arc::new(Barrier::new(clients.len()));
    let handles: Vec<_> = clients
        .iter()
        .map(|client| {
            let client = Arc::clone(client);
            let barrier = Arc::clone(&barrier);
            let key = key.clone();
            thread::spawn(move || {
                barrier.wait();
                let ts = client.now();
                (0..50)
                    .map(|_| client.increment_sequence_values(&[key.clone()], ts).remove(0).unwrap())
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut seen = BTreeSet::new();
    for handle in handles {
        let values = handle.join().unwrap();
        assert!(values.windows(2).all(|w| w[0] < w[1]), "per-client values increase");
        for v in values {
            assert!(seen.insert(v), "value {v} handed out twice");
        }
    }
    assert_eq!(seen.len(), 200);
}

#[test]
fn concurrent_create_has_one_winner() {
    let (services, _) = manual_services(EngineConfig::for_testing());
    let table = orders_table(1);
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let services = Arc::clone(&services);
            let barrier = Arc::clone(&barrier);
            let mutations = orders_builder().create_table(&table);
            thread::spawn(move || {
                barrier.wait();
                services.create_table(&mutations).unwrap().code
            })
        })
        .collect();
    let codes: Vec<MutationCode> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = codes.iter().filter(|c| **c == MutationCode::TableNotFound).count();
    assert_eq!(winners, 1, "codes: {codes:?}");
    assert!(codes
        .iter()
        .all(|c| matches!(c, MutationCode::TableNotFound | MutationCode::TableAlreadyExists)));
}

#[test]
fn readers_keep_their_snapshot_during_schema_change() {
    let (services, clock) = manual_services(EngineConfig::for_testing());
    let created = services.create_table(&orders_builder().create_table(&orders_table(1))).unwrap();
    let original = created.table.unwrap();
    services.add_table((*original).clone());

    let reader_view = services.metadata();
    let read_ts = clock.now();

    clock.advance(100);
    let extra = [ColumnDef::new("QTY", Some("0"), LogicalType::Integer)];
    let added = services
        .add_column(&orders_builder().add_columns(2, false, &extra))
        .unwrap();
    assert_eq!(added.code, MutationCode::TableAlreadyExists);
    let updated = added.table.unwrap();
    services
        .add_columns("APP.ORDERS", extra.to_vec(), updated.timestamp, 2, false)
        .unwrap();

    // the reader's copy of the cache is untouched
    assert_eq!(reader_view.get_table("APP.ORDERS").unwrap().columns.len(), 2);
    assert_eq!(services.metadata().get_table("APP.ORDERS").unwrap().columns.len(), 3);

    // resolving at the reader's timestamp still reports the old table as current
    let at_read = services
        .resolve_table(&TenantId::global(), "APP", "ORDERS", original.timestamp, read_ts)
        .unwrap();
    assert_eq!(at_read.code, MutationCode::TableAlreadyExists);

    let latest = services
        .resolve_table(&TenantId::global(), "APP", "ORDERS", original.timestamp, Timestamp::MAX)
        .unwrap();
    assert_eq!(latest.code, MutationCode::NewerTableFound);
    assert_eq!(latest.table.unwrap().columns.len(), 3);
}

#[test]
fn stale_schema_change_is_rejected() {
    let (services, clock) = manual_services(EngineConfig::for_testing());
    services.create_table(&orders_builder().create_table(&orders_table(1))).unwrap();
    clock.advance(10);

    let a = [ColumnDef::new("A", None, LogicalType::Integer)];
    let b = [ColumnDef::new("B", None, LogicalType::Integer)];
    let first = services.add_column(&orders_builder().add_columns(2, false, &a)).unwrap();
    assert_eq!(first.code, MutationCode::TableAlreadyExists);
    clock.advance(10);
    // a second client computed its change against sequence number 1 too
    let second = services.add_column(&orders_builder().add_columns(2, false, &b)).unwrap();
    assert_eq!(second.code, MutationCode::ConcurrentTableMutation);
    assert_eq!(second.table.unwrap().sequence_number, 2);
}

#[test]
fn tenants_share_sequences_but_not_caches() {
    let (services, _) = manual_services(EngineConfig::for_testing());
    let acme = TenantId::new("acme");
    let child = services.child_service(&acme);
    let again = services.child_service(&acme);

    child.add_table(orders_table(1));
    assert!(again.metadata().find_table("APP.ORDERS").is_some());
    assert!(services.metadata().find_table("APP.ORDERS").is_none());

    let key = SequenceKey::new(acme.clone(), "APP", "IDS");
    let ts = child.now();
    child.create_sequence(&key, 100, -1, 5, ts).unwrap();
    let values: Vec<i64> = (0..3)
        .map(|_| services.increment_sequence_values(&[key.clone()], ts).remove(0).unwrap())
        .collect();
    assert_eq!(values, vec![100, 99, 98]);
}

#[test]
fn config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[sequence]\ndefault_cache_size = 25\n\n[features]\nreverse_scan = false").unwrap();
    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.sequence.default_cache_size, 25);

    let services = QueryServices::in_memory(config).unwrap();
    assert!(!services.supports_feature(strata_meta::Feature::ReverseScan));

    let key = SequenceKey::new(TenantId::global(), "", "S");
    let ts = services.now();
    services.create_sequence(&key, 0, 1, 0, ts).unwrap();
    let batch = services.reserve_sequence_values(&[key], ts).remove(0).unwrap();
    assert_eq!(batch.count, 25);

    let mut bad = EngineConfig::for_testing();
    bad.sequence.max_cas_attempts = 0;
    assert!(matches!(QueryServices::in_memory(bad), Err(StrataError::InvalidConfig { .. })));

    let mut bad = EngineConfig::for_testing();
    bad.metadata.max_cas_attempts = 0;
    assert!(matches!(QueryServices::in_memory(bad), Err(StrataError::InvalidConfig { .. })));
}

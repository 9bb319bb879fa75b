//! # strata-meta
//!
//! Schema metadata and sequence coordination for Strata.
//!
//! The coordination service sits between compiled statements and the
//! sorted key-value store. It resolves table metadata as of a timestamp,
//! applies schema mutations with conditional writes so that exactly one
//! concurrent writer wins, and hands out sequence values in batches.
//!
//! This crate implements:
//! - The [`KeyValueStore`] capability and an in-memory store
//! - Catalog row keys and schema mutations
//! - Immutable table snapshots and the copy-on-write [`MetadataStore`]
//! - Sequence records, batch reservation and the client-side batch cache
//! - [`QueryServices`], the coordination service, with per-tenant children
//!
//! ## Example
//!
//! ```rust
//! use strata_common::config::EngineConfig;
//! use strata_meta::{CoordinationService, QueryServices, SequenceKey, TenantId};
//!
//! let services = QueryServices::in_memory(EngineConfig::for_testing()).unwrap();
//! let key = SequenceKey::new(TenantId::global(), "APP", "ORDER_IDS");
//! let ts = services.now();
//! services.create_sequence(&key, 1, 1, 10, ts).unwrap();
//!
//! let batch = services.reserve_sequence_values(&[key], ts).remove(0).unwrap();
//! assert_eq!(batch.values().collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Feature flags
pub mod features;

/// Key-value store capability
pub mod kv;

/// Copy-on-write table cache
pub mod metadata;

/// Row-level schema mutations
pub mod mutation;

/// Mutation result codes
pub mod result;

/// Catalog row keys
pub mod row_key;

/// Sequence records and batching
pub mod sequence;

/// The coordination service
pub mod services;

/// Table snapshots
pub mod table;

pub use features::Feature;
pub use kv::{KeyValueStore, KvWrite, MemoryKvStore, VersionedValue};
pub use metadata::MetadataStore;
pub use mutation::{Mutation, MutationKind, TableMutationBuilder};
pub use result::{MutationCode, MutationResult};
pub use row_key::{RowKeyParts, TenantId};
pub use sequence::{SequenceBatch, SequenceKey};
pub use services::{CoordinationService, QueryServices};
pub use table::{ColumnDef, IndexState, TableSnapshot, TableType};

//! # strata-types
//!
//! Binary type codec for Strata.
//!
//! Every SQL value is stored and compared as an order-preserving byte
//! string: if `a < b` logically then `encode(a) < encode(b)` under unsigned
//! lexicographic comparison, and the inequality flips for columns stored in
//! descending order. This lets the key-value store use encoded values
//! directly as row keys and filter bounds.
//!
//! This crate implements:
//! - Logical types and their coercion rules
//! - Decoded values (`Datum`) and encoded values (`EncodedValue`)
//! - Per-type encoders/decoders and byte comparison
//! - Decimal normalization to a precision/scale
//!
//! ## Example
//!
//! ```rust
//! use strata_types::{codec, Datum, LogicalType};
//!
//! let a = codec::encode(LogicalType::Integer, &Datum::Integer(-5)).unwrap();
//! let b = codec::encode(LogicalType::Integer, &Datum::Integer(3)).unwrap();
//! assert!(a < b);
//! assert_eq!(
//!     codec::decode(LogicalType::Integer, a.as_bytes()).unwrap(),
//!     Some(Datum::Integer(-5))
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Per-type encoders, decoders and comparison
pub mod codec;

/// Coercion between logical types
pub mod coerce;

/// Decoded SQL values
pub mod datum;

/// Decimal normalization
pub mod decimal;

/// Logical type descriptors
pub mod data_type;

/// Ascending/descending storage order
pub mod sort_order;

/// Encoded value references
pub mod value;

pub use coerce::{coerce_bytes, coerce_datum};
pub use data_type::{LogicalType, TypeFamily};
pub use datum::Datum;
pub use sort_order::SortOrder;
pub use value::EncodedValue;

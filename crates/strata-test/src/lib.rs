//! # strata-test
//!
//! Integration tests for Strata.
//!
//! This crate contains:
//! - Codec ordering and decimal normalization properties
//! - Expression evaluation, IN-list semantics and wire round trips
//! - Catalog and sequence coordination, including concurrent callers

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

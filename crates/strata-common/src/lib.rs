//! # strata-common
//!
//! Common types, errors, and configuration for Strata.
//!
//! This crate provides the foundations shared by the codec, the expression
//! engine and the coordination service:
//!
//! - **Types**: row keys, timestamps and timestamp sources
//! - **Errors**: unified error handling with `StrataError`
//! - **Config**: engine configuration loaded from TOML
//! - **Constants**: wire and encoding constants
//!
//! ## Example
//!
//! ```rust
//! use strata_common::error::StrataResult;
//! use strata_common::types::{Key, Timestamp};
//!
//! fn example() -> StrataResult<()> {
//!     let key = Key::from_bytes(b"\0APP\0ORDERS");
//!     let ts = Timestamp::from_micros(42);
//!     assert_eq!(key.len(), 11);
//!     assert_eq!(ts.as_micros(), 42);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use error::{ErrorCode, StrataError, StrataResult};
pub use types::{Key, ManualClock, SystemClock, Timestamp, TimestampSource};

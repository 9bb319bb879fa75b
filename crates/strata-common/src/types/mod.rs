//! Type definitions for Strata.
//!
//! Row keys and timestamps shared by every layer.

mod keys;
mod timestamps;

pub use keys::Key;
pub use timestamps::{ManualClock, SystemClock, Timestamp, TimestampSource};

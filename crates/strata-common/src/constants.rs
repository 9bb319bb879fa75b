//! System-wide constants for Strata.
//!
//! These values are part of the on-disk and on-wire formats; changing them
//! breaks compatibility with existing data.

// =============================================================================
// Encoding Constants
// =============================================================================

/// Encoded form of boolean `true`.
pub const TRUE_BYTES: &[u8] = &[1];

/// Encoded form of boolean `false`.
pub const FALSE_BYTES: &[u8] = &[0];

/// Separator between variable-width components of a row key.
pub const SEPARATOR_BYTE: u8 = 0x00;

/// Follows every 0x00 of a variable-width value before it is stored in
/// descending order.
pub const DESC_ESCAPE_BYTE: u8 = 0xFF;

/// Ends a variable-width value before it is stored in descending order.
///
/// No escaped body contains two consecutive 0x00 bytes, so the terminator
/// makes the escaped form prefix-free and inversion reverses its order.
pub const DESC_TERMINATOR: [u8; 2] = [0x00, 0x00];

/// Maximum number of significant decimal digits of a DECIMAL value.
pub const MAX_DECIMAL_PRECISION: u32 = 28;

/// Maximum scale of a DECIMAL value.
pub const MAX_DECIMAL_SCALE: u32 = 28;

// =============================================================================
// Expression Wire Constants
// =============================================================================

/// Version byte written in front of every serialized expression tree.
pub const EXPRESSION_WIRE_VERSION: u8 = 1;

/// Maximum nesting depth accepted when deserializing an expression tree.
pub const MAX_EXPRESSION_DEPTH: usize = 256;

/// Default display truncation for IN-lists.
pub const DEFAULT_MAX_DISPLAY_VALUES_LEN: usize = 200;

// =============================================================================
// Metadata Constants
// =============================================================================

/// Column family holding schema header cells.
pub const TABLE_FAMILY: &[u8] = b"0";

/// Default soft bound on cached tables before a warning is logged.
pub const DEFAULT_MAX_CACHED_TABLES: usize = 10_000;

// =============================================================================
// Sequence Constants
// =============================================================================

/// Default number of values reserved per round-trip to the store.
pub const DEFAULT_SEQUENCE_CACHE_SIZE: u32 = 100;

/// Default bound on conditional-write attempts for one sequence or catalog update.
pub const DEFAULT_MAX_CAS_ATTEMPTS: u32 = 16;

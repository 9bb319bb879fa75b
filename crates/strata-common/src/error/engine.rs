//! Engine error types.
//!
//! Covers the codec, the expression engine and the coordination service.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Operation not supported.
    NotSupported = 0x0002,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,
    /// General I/O error.
    Io = 0x0004,
    /// Invalid configuration.
    InvalidConfig = 0x0005,

    // Type errors (0x0100 - 0x01FF)
    /// Incompatible coercion between logical types.
    TypeMismatch = 0x0100,
    /// Value does not fit the target type.
    ConstraintViolation = 0x0101,
    /// Decimal does not fit the target precision/scale.
    PrecisionOverflow = 0x0102,
    /// Encoded bytes are not valid for the logical type.
    IllegalData = 0x0103,

    // Expression errors (0x0200 - 0x02FF)
    /// Malformed serialized expression.
    Serialization = 0x0200,

    // Metadata errors (0x0300 - 0x03FF)
    /// Table not found.
    TableNotFound = 0x0300,
    /// A concurrent metadata writer won.
    SchemaVersionConflict = 0x0301,

    // Sequence errors (0x0400 - 0x04FF)
    /// Sequence already exists.
    SequenceAlreadyExists = 0x0400,
    /// Sequence not found.
    SequenceNotFound = 0x0401,
    /// Sequence reached the end of its value range.
    SequenceExhausted = 0x0402,

    // Store errors (0x0500 - 0x05FF)
    /// Retryable backing-store failure.
    TransientStore = 0x0500,
    /// Non-retryable backing-store failure.
    PermanentStore = 0x0501,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Type",
            0x02 => "Expression",
            0x03 => "Metadata",
            0x04 => "Sequence",
            0x05 => "Store",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for Strata.
///
/// Each variant carries enough context (entity identity, attempted
/// operation) for the embedding system to log or present it.
///
/// # Example
///
/// ```rust
/// use strata_common::error::{StrataError, StrataResult};
///
/// fn lookup(name: &str) -> StrataResult<()> {
///     Err(StrataError::TableNotFound { table: name.to_string() })
/// }
/// assert!(lookup("ORDERS").is_err());
/// ```
#[derive(Debug, Error)]
pub enum StrataError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Operation not supported.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Type Errors
    // ==========================================================================
    /// Coercion across incompatible type families.
    #[error("type mismatch: cannot coerce {from} to {to}")]
    TypeMismatch {
        /// Source type.
        from: String,
        /// Target type.
        to: String,
    },

    /// A value of a compatible type does not fit the target type.
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        /// Error message.
        message: String,
    },

    /// Decimal cannot be represented with the target precision and scale.
    #[error("value {value} does not fit DECIMAL({precision},{scale})")]
    PrecisionOverflow {
        /// The offending value.
        value: String,
        /// Target precision.
        precision: u32,
        /// Target scale.
        scale: u32,
    },

    /// Encoded bytes are not a valid encoding of the logical type.
    #[error("illegal data for {data_type}: {reason}")]
    IllegalData {
        /// The logical type being decoded.
        data_type: String,
        /// Reason for rejection.
        reason: String,
    },

    // ==========================================================================
    // Expression Errors
    // ==========================================================================
    /// Malformed serialized expression.
    #[error("serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Metadata Errors
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// A concurrent writer changed the table first.
    #[error("concurrent mutation of '{table}': expected sequence number {expected}, found {actual}")]
    SchemaVersionConflict {
        /// The contended table.
        table: String,
        /// Sequence number the caller based its change on.
        expected: u64,
        /// Sequence number currently stored.
        actual: u64,
    },

    // ==========================================================================
    // Sequence Errors
    // ==========================================================================
    /// Sequence already exists.
    #[error("sequence '{sequence}' already exists")]
    SequenceAlreadyExists {
        /// Fully qualified sequence name.
        sequence: String,
    },

    /// Sequence not found.
    #[error("sequence '{sequence}' not found")]
    SequenceNotFound {
        /// Fully qualified sequence name.
        sequence: String,
    },

    /// Sequence cannot allocate further values.
    #[error("sequence '{sequence}' exhausted its value range")]
    SequenceExhausted {
        /// Fully qualified sequence name.
        sequence: String,
    },

    // ==========================================================================
    // Store Errors
    // ==========================================================================
    /// Retryable failure of the backing store.
    #[error("transient store failure during {operation}: {reason}")]
    TransientStore {
        /// Attempted operation.
        operation: String,
        /// Reason for failure.
        reason: String,
    },

    /// Non-retryable failure of the backing store.
    #[error("permanent store failure during {operation}: {reason}")]
    PermanentStore {
        /// Attempted operation.
        operation: String,
        /// Reason for failure.
        reason: String,
    },
}

impl StrataError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::NotSupported { .. } => ErrorCode::NotSupported,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Io { .. } => ErrorCode::Io,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::ConstraintViolation { .. } => ErrorCode::ConstraintViolation,
            Self::PrecisionOverflow { .. } => ErrorCode::PrecisionOverflow,
            Self::IllegalData { .. } => ErrorCode::IllegalData,
            Self::Serialization { .. } => ErrorCode::Serialization,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::SchemaVersionConflict { .. } => ErrorCode::SchemaVersionConflict,
            Self::SequenceAlreadyExists { .. } => ErrorCode::SequenceAlreadyExists,
            Self::SequenceNotFound { .. } => ErrorCode::SequenceNotFound,
            Self::SequenceExhausted { .. } => ErrorCode::SequenceExhausted,
            Self::TransientStore { .. } => ErrorCode::TransientStore,
            Self::PermanentStore { .. } => ErrorCode::PermanentStore,
        }
    }

    /// Returns true if the caller may retry the operation.
    ///
    /// Schema conflicts are retryable after re-resolving metadata.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientStore { .. } | Self::SchemaVersionConflict { .. }
        )
    }

    /// Returns true if this error means a value could not be coerced.
    #[must_use]
    pub const fn is_coercion_failure(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. } | Self::ConstraintViolation { .. }
        )
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a constraint violation error.
    #[must_use]
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Creates an illegal data error.
    #[must_use]
    pub fn illegal_data(data_type: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::IllegalData {
            data_type: data_type.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = StrataError::TableNotFound {
            table: "APP.ORDERS".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::TableNotFound);
        assert_eq!(err.code().category(), "Metadata");
    }

    #[test]
    fn test_error_display() {
        let err = StrataError::PrecisionOverflow {
            value: "123.45".to_string(),
            precision: 3,
            scale: 1,
        };
        assert_eq!(err.to_string(), "value 123.45 does not fit DECIMAL(3,1)");
    }

    #[test]
    fn test_retryable() {
        let transient = StrataError::TransientStore {
            operation: "get".to_string(),
            reason: "region moved".to_string(),
        };
        let permanent = StrataError::PermanentStore {
            operation: "get".to_string(),
            reason: "access denied".to_string(),
        };
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
        assert!(StrataError::SchemaVersionConflict {
            table: "T".to_string(),
            expected: 1,
            actual: 2,
        }
        .is_retryable());
    }

    #[test]
    fn test_coercion_failure() {
        assert!(StrataError::type_mismatch("VARCHAR", "INTEGER").is_coercion_failure());
        assert!(StrataError::constraint_violation("300 out of range").is_coercion_failure());
        assert!(!StrataError::internal("bug").is_coercion_failure());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StrataError = io_err.into();
        assert_eq!(err.code(), ErrorCode::Io);
        assert_eq!(err.code().category(), "General");
    }
}

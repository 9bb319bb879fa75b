//! Engine configuration structures.
//!
//! Loaded once when the coordination service is created and treated as
//! immutable afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{
    DEFAULT_MAX_CACHED_TABLES, DEFAULT_MAX_CAS_ATTEMPTS, DEFAULT_MAX_DISPLAY_VALUES_LEN,
    DEFAULT_SEQUENCE_CACHE_SIZE,
};
use crate::error::{StrataError, StrataResult};

/// Main engine configuration.
///
/// # Example
///
/// ```rust
/// use strata_common::config::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("[sequence]\ndefault_cache_size = 10\n").unwrap();
/// assert_eq!(config.sequence.default_cache_size, 10);
/// assert!(config.features.reverse_scan);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Expression engine configuration.
    pub expression: ExpressionConfig,

    /// Sequence allocation configuration.
    pub sequence: SequenceConfig,

    /// Metadata cache configuration.
    pub metadata: MetadataConfig,

    /// Feature flags advertised to connections.
    pub features: FeatureConfig,
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> StrataResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| StrataError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> StrataResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml(&self) -> StrataResult<String> {
        toml::to_string_pretty(self).map_err(|e| StrataError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Creates a configuration for tests: small sequence batches.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            sequence: SequenceConfig {
                default_cache_size: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> StrataResult<()> {
        if self.sequence.default_cache_size == 0 {
            return Err(StrataError::InvalidConfig {
                message: "sequence.default_cache_size must be at least 1".to_string(),
            });
        }

        if self.sequence.max_cas_attempts == 0 {
            return Err(StrataError::InvalidConfig {
                message: "sequence.max_cas_attempts must be at least 1".to_string(),
            });
        }

        if self.metadata.max_cas_attempts == 0 {
            return Err(StrataError::InvalidConfig {
                message: "metadata.max_cas_attempts must be at least 1".to_string(),
            });
        }

        if self.expression.max_display_values_len < 16 {
            return Err(StrataError::InvalidConfig {
                message: "expression.max_display_values_len must be at least 16".to_string(),
            });
        }

        Ok(())
    }
}

/// Expression engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Characters after which an IN-list display is truncated.
    /// Default: 200
    pub max_display_values_len: usize,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            max_display_values_len: DEFAULT_MAX_DISPLAY_VALUES_LEN,
        }
    }
}

/// Sequence allocation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Values reserved per batch when a sequence does not set its own.
    /// Default: 100
    pub default_cache_size: u32,

    /// Conditional-mutation attempts before a reservation gives up.
    /// Default: 16
    pub max_cas_attempts: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            default_cache_size: DEFAULT_SEQUENCE_CACHE_SIZE,
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
        }
    }
}

/// Metadata cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Cached table count above which a warning is logged.
    /// Default: 10000
    pub max_cached_tables: usize,

    /// Conditional writes a catalog mutation attempts before it reports a
    /// transient store error.
    /// Default: 16
    pub max_cas_attempts: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            max_cached_tables: DEFAULT_MAX_CACHED_TABLES,
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
        }
    }
}

/// Feature flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// The store can scan key ranges in reverse.
    /// Default: true
    pub reverse_scan: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { reverse_scan: true }
    }
}

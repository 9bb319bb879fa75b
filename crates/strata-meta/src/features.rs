//! Feature flags.

use std::fmt;
use std::str::FromStr;

use strata_common::config::FeatureConfig;
use strata_common::StrataError;

/// Optional capabilities of the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Scans may run in descending key order.
    ReverseScan,
}

impl Feature {
    /// Every known feature.
    pub const ALL: [Feature; 1] = [Feature::ReverseScan];

    /// Name used in configuration and client handshakes.
    pub fn name(self) -> &'static str {
        match self {
            Feature::ReverseScan => "REVERSE_SCAN",
        }
    }

    /// Whether `config` enables this feature.
    pub fn is_enabled(self, config: &FeatureConfig) -> bool {
        match self {
            Feature::ReverseScan => config.reverse_scan,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| StrataError::invalid_argument(format!("unknown feature {s}")))
    }
}

//! Configuration for Strata.
//!
//! This module provides configuration structures for the expression engine
//! and the coordination service.

mod engine;

pub use engine::{EngineConfig, ExpressionConfig, FeatureConfig, MetadataConfig, SequenceConfig};

/// Error type shared by the whole crate
pub mod error;

/// Colorimetry identifiers (gamut standard, transfer function, capability class)
pub mod colorimetry;

/// Sub-module register geometry and value packing
pub mod packer;

/// Packed coefficient entries and merge groups
pub mod blob;

/// Serialized per-layer coefficient buffer
pub mod buffer;

/// Adaptive breakpoint sampling and the curve evaluators it samples
pub mod curve;

/// Parametric tone curve estimation from dynamic luminance statistics
pub mod ootf;

/// Hardware capability records and module specifiers
pub mod hw;

/// Colorimetry and luminance indexed coefficient tables
pub mod tables;

/// Configuration sources feeding the builder
pub mod config;

/// Per-layer coefficient build state machine
pub mod builder;

/// Various utils
pub mod utils;

/// XML configuration documents
#[cfg(feature = "xml")]
pub mod xml;

#[cfg(test)]
mod fixtures;

pub use builder::{LayerCoefficientBuilder, LayerDescriptor, TargetDescriptor};
pub use config::{Capabilities, ConfigSource, StaticConfig};
pub use error::{HdrCoefError, Result};

use thiserror::Error;

use crate::builder::FrameState;

#[derive(Debug, Error)]
pub enum HdrCoefError {
    #[error("{op} is not allowed in state {state:?}")]
    InvalidState { op: &'static str, state: FrameState },

    #[error("layer {0} has no hardware module")]
    UnknownLayer(usize),

    #[error("sub-module {name}: expected {expected} values, got {actual}")]
    GeometryMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid geometry for sub-module {name}: {reason}")]
    InvalidGeometry { name: String, reason: String },

    #[error("cannot merge entries of group {group_id}: headers differ")]
    IncompatibleMerge { group_id: i32 },

    #[error("no table entry for {family} at {luminance} nits")]
    LookupMiss {
        family: &'static str,
        luminance: u32,
    },

    #[error("failed loading configuration {path}: {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("layer {0} coefficients are not ready")]
    NotReady(usize),

    #[error("curve sampling needs at least 2 points, got {0}")]
    InvalidSampleCount(usize),

    #[error("curve sampling produced {produced} distinct points, {requested} requested")]
    SampleUnderflow { requested: usize, produced: usize },

    #[error("output buffer too small: {needed} bytes needed, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("invalid value: {0}")]
    Parse(String),

    #[error("malformed coefficient buffer: {0}")]
    MalformedBuffer(String),
}

pub type Result<T> = std::result::Result<T, HdrCoefError>;

//! Error types for anchordet.

use thiserror::Error;

/// Result alias for anchordet operations.
pub type AnchorDetResult<T> = std::result::Result<T, AnchorDetError>;

/// Errors that can occur when decoding or suppressing detections.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnchorDetError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The network input dimensions are zero.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// A configuration field holds an unusable value.
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    /// The regression buffer does not split into whole per-anchor rows.
    #[error("shape mismatch: {boxes} box values for {scores} scores")]
    ShapeMismatch { boxes: usize, scores: usize },
    /// Reading an anchor asset failed.
    #[error("io error: {reason}")]
    Io { reason: String },
}

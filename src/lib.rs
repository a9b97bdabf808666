//! anchordet turns the raw output of anchor-based single-shot detectors
//! (BlazeFace, BlazePalm and relatives) into final detections.
//!
//! Decoding maps per-anchor box regressions and logits onto normalized image
//! coordinates; greedy non-maximum suppression then removes overlapping
//! candidates. Decoding can optionally run on rayon's thread pool via the
//! `rayon` feature.

pub mod anchor;
pub mod config;
pub mod decode;
pub mod detection;
mod detector;
pub mod lowlevel;
pub mod suppress;
mod trace;
pub mod util;

pub use anchor::{Anchor, AnchorTable};
pub use config::{DetectorConfig, ModelPreset, SuppressionMode};
pub use decode::RawPrediction;
pub use detection::{Detection, Keypoint};
pub use detector::Detector;
pub use util::{AnchorDetError, AnchorDetResult};

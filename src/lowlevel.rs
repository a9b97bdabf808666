//! Building blocks for custom post-processing pipelines.
//!
//! These expose the decoder, the suppression strategies and anchor generation
//! separately. Most users should prefer [`Detector`](crate::Detector).

pub use crate::anchor::{generate_anchors, load_anchor_file, AnchorOptions, ElementType};
pub use crate::decode::{decode, RawPrediction};
pub use crate::suppress::{suppress, suppress_weighted, suppress_with};

#[cfg(feature = "rayon")]
pub use crate::decode::rayon::decode_par;

//! Decode-then-suppress pipeline over a fixed anchor table.

use crate::anchor::AnchorTable;
use crate::config::{DetectorConfig, ModelPreset};
use crate::decode::RawPrediction;
use crate::detection::Detection;
use crate::suppress::suppress_with;
use crate::trace::trace_span;
use crate::util::AnchorDetResult;

/// Anchor table plus configuration, reusable across inferences.
///
/// Holds no per-call state, so a single detector can serve many threads.
#[derive(Clone, Debug)]
pub struct Detector {
    anchors: AnchorTable,
    cfg: DetectorConfig,
}

impl Detector {
    /// Creates a detector after validating `cfg`.
    pub fn new(anchors: AnchorTable, cfg: DetectorConfig) -> AnchorDetResult<Self> {
        cfg.validate()?;
        Ok(Self { anchors, cfg })
    }

    /// Creates a detector with generated anchors and the preset's constants.
    pub fn from_preset(preset: ModelPreset) -> AnchorDetResult<Self> {
        let anchors = AnchorTable::generate(&preset.anchor_options())?;
        Self::new(anchors, preset.detector_config())
    }

    /// Returns a copy of this detector using `cfg`.
    pub fn with_config(self, cfg: DetectorConfig) -> AnchorDetResult<Self> {
        Self::new(self.anchors, cfg)
    }

    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    /// Decodes `raw` and suppresses overlapping results.
    ///
    /// `aspect_ratio` is the width/height ratio of the source frame.
    pub fn detect(
        &self,
        raw: RawPrediction<'_>,
        aspect_ratio: f32,
    ) -> AnchorDetResult<Vec<Detection>> {
        let _span = trace_span!("detect").entered();
        let candidates = self.decode(raw, aspect_ratio)?;
        Ok(suppress_with(
            candidates,
            self.cfg.iou_suppression_threshold,
            self.cfg.suppression,
        ))
    }

    #[cfg(not(feature = "rayon"))]
    fn decode(&self, raw: RawPrediction<'_>, aspect_ratio: f32) -> AnchorDetResult<Vec<Detection>> {
        crate::decode::decode(raw, &self.anchors, &self.cfg, aspect_ratio)
    }

    #[cfg(feature = "rayon")]
    fn decode(&self, raw: RawPrediction<'_>, aspect_ratio: f32) -> AnchorDetResult<Vec<Detection>> {
        crate::decode::rayon::decode_par(raw, &self.anchors, &self.cfg, aspect_ratio)
    }
}

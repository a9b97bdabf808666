//! Anchor-relative decoding of raw detector output.
//!
//! The network emits, per anchor, a row of `D` regression values (box center,
//! box size, then `K` keypoint pairs, all in input-pixel units) and a single
//! logit. Decoding rescales the regressions into normalized space relative to
//! the anchor, applies the source-frame aspect ratio to the y axis and keeps
//! anchors whose clamped-sigmoid score reaches the threshold.

use crate::anchor::{Anchor, AnchorTable};
use crate::config::DetectorConfig;
use crate::detection::{Detection, Keypoint};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::math::clamped_sigmoid;
use crate::util::{AnchorDetError, AnchorDetResult};

#[cfg(feature = "rayon")]
pub mod rayon;

/// Borrowed raw output of one inference.
#[derive(Clone, Copy, Debug)]
pub struct RawPrediction<'a> {
    /// Regression values, row-major, `D` values per anchor.
    pub boxes: &'a [f32],
    /// One logit per anchor.
    pub scores: &'a [f32],
}

impl<'a> RawPrediction<'a> {
    pub fn new(boxes: &'a [f32], scores: &'a [f32]) -> Self {
        Self { boxes, scores }
    }

    /// Number of anchor positions `N`.
    pub fn num_anchors(&self) -> usize {
        self.scores.len()
    }

    /// Regression values per anchor `D`, validated against the buffer sizes.
    ///
    /// Requires at least the four box values and whole keypoint pairs.
    pub fn values_per_anchor(&self) -> AnchorDetResult<usize> {
        let n = self.scores.len();
        let mismatch = AnchorDetError::ShapeMismatch {
            boxes: self.boxes.len(),
            scores: n,
        };
        if n == 0 || self.boxes.len() % n != 0 {
            return Err(mismatch);
        }
        let d = self.boxes.len() / n;
        if d < 4 || (d - 4) % 2 != 0 {
            return Err(mismatch);
        }
        Ok(d)
    }

    /// Number of keypoints `K` per anchor.
    pub fn num_keypoints(&self) -> AnchorDetResult<usize> {
        Ok((self.values_per_anchor()? - 4) / 2)
    }
}

/// Per-call constants shared by every anchor.
#[derive(Clone, Copy)]
pub(crate) struct DecodeParams {
    inv_width: f32,
    inv_height: f32,
    aspect_ratio: f32,
    min_score: f32,
    clamp: f32,
    stride: usize,
}

impl DecodeParams {
    pub(crate) fn new(
        raw: &RawPrediction<'_>,
        cfg: &DetectorConfig,
        aspect_ratio: f32,
    ) -> AnchorDetResult<Option<Self>> {
        cfg.validate()?;
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(AnchorDetError::InvalidInput(
                "aspect ratio must be finite and positive",
            ));
        }
        if raw.scores.is_empty() {
            if raw.boxes.is_empty() {
                return Ok(None);
            }
            return Err(AnchorDetError::ShapeMismatch {
                boxes: raw.boxes.len(),
                scores: 0,
            });
        }
        let stride = raw.values_per_anchor()?;
        Ok(Some(Self {
            inv_width: 1.0 / cfg.input_width as f32,
            inv_height: 1.0 / cfg.input_height as f32,
            aspect_ratio,
            min_score: cfg.min_score_threshold,
            clamp: cfg.score_clamp,
            stride,
        }))
    }
}

pub(crate) fn warn_on_anchor_mismatch(anchors: &AnchorTable, raw: &RawPrediction<'_>) {
    if anchors.len() != raw.num_anchors() {
        trace_warn!(
            "anchor_count_mismatch",
            anchors = anchors.len(),
            predictions = raw.num_anchors()
        );
    }
}

/// Decodes one anchor, returning `None` when it scores below threshold.
pub(crate) fn decode_anchor(
    idx: usize,
    row: &[f32],
    logit: f32,
    anchor: Anchor,
    p: &DecodeParams,
) -> Option<Detection> {
    let score = clamped_sigmoid(logit, p.clamp);
    // NaN logits never pass.
    if score.is_nan() || score < p.min_score {
        return None;
    }
    debug_assert_eq!(row.len(), p.stride, "row {idx} has wrong width");

    let x_center = row[0] * p.inv_width * anchor.w + anchor.x_center;
    let y_center = row[1] * p.inv_height * anchor.h + anchor.y_center;
    let width = row[2] * p.inv_width * anchor.w;
    let height = row[3] * p.inv_height * anchor.h * p.aspect_ratio;

    let keypoints = row[4..]
        .chunks_exact(2)
        .map(|kp| {
            let x = kp[0] * p.inv_width * anchor.w + anchor.x_center;
            let y = kp[1] * p.inv_height * anchor.h + anchor.y_center;
            Keypoint::new(x, y * p.aspect_ratio)
        })
        .collect();

    Some(Detection {
        x_center,
        y_center: y_center * p.aspect_ratio,
        width,
        height,
        score,
        keypoints,
    })
}

/// Decodes every anchor whose score reaches `cfg.min_score_threshold`.
///
/// Output is in ascending anchor order. When the table is shorter than the
/// prediction, the missing anchors decode against [`Anchor::IDENTITY`].
/// `aspect_ratio` is the width/height ratio of the source frame.
pub fn decode(
    raw: RawPrediction<'_>,
    anchors: &AnchorTable,
    cfg: &DetectorConfig,
    aspect_ratio: f32,
) -> AnchorDetResult<Vec<Detection>> {
    let Some(params) = DecodeParams::new(&raw, cfg, aspect_ratio)? else {
        return Ok(Vec::new());
    };
    let _span = trace_span!("decode", anchors = raw.num_anchors()).entered();
    warn_on_anchor_mismatch(anchors, &raw);

    let detections: Vec<Detection> = raw
        .boxes
        .chunks_exact(params.stride)
        .zip(raw.scores.iter())
        .enumerate()
        .filter_map(|(idx, (row, &logit))| {
            decode_anchor(idx, row, logit, anchors.get_or_identity(idx), &params)
        })
        .collect();

    trace_event!("decoded", candidates = detections.len());
    Ok(detections)
}

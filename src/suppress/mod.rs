//! Non-maximum suppression over decoded detections.
//!
//! Both strategies are greedy: repeatedly take the best remaining candidate
//! and remove every candidate overlapping it by more than the IoU threshold.
//! They differ only in what is emitted for the kept candidate.

mod weighted;

pub use weighted::suppress_weighted;

use crate::config::SuppressionMode;
use crate::detection::Detection;
use crate::trace::{trace_event, trace_span};

/// Index of the first candidate holding the maximum score.
///
/// NaN scores rank below every real score.
pub(crate) fn first_max_index(candidates: &[Detection]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, det) in candidates.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) => {
                let current = candidates[b].score;
                det.score > current || (current.is_nan() && !det.score.is_nan())
            }
        };
        if better {
            best = Some(idx);
        }
    }
    best
}

/// Greedy max-score-first suppression.
///
/// Returns the kept detections in selection order, which is non-increasing in
/// score. Ties go to the candidate that appears first. Candidates are dropped,
/// never merged.
pub fn suppress(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let _span = trace_span!("suppress", candidates = detections.len()).entered();
    let mut candidates = detections;
    let mut kept = Vec::new();

    while let Some(idx) = first_max_index(&candidates) {
        let best = candidates.remove(idx);
        candidates.retain(|det| best.iou(det) <= iou_threshold);
        kept.push(best);
    }

    trace_event!("suppressed", kept = kept.len());
    kept
}

/// Dispatches to the strategy selected by `mode`.
pub fn suppress_with(
    detections: Vec<Detection>,
    iou_threshold: f32,
    mode: SuppressionMode,
) -> Vec<Detection> {
    match mode {
        SuppressionMode::Greedy => suppress(detections, iou_threshold),
        SuppressionMode::WeightedAverage => suppress_weighted(detections, iou_threshold),
    }
}

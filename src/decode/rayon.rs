//! Rayon-parallel decoding (feature-gated).
//!
//! Anchors are split into fixed-size chunks decoded on the thread pool; chunk
//! results are concatenated in order, so the output is identical to
//! [`decode`](super::decode).

use crate::anchor::AnchorTable;
use crate::config::DetectorConfig;
use crate::decode::{decode_anchor, warn_on_anchor_mismatch, DecodeParams, RawPrediction};
use crate::detection::Detection;
use crate::trace::{trace_event, trace_span};
use crate::util::AnchorDetResult;
use rayon::prelude::*;

/// Anchors decoded per rayon task.
const CHUNK_ANCHORS: usize = 256;

/// Parallel counterpart of [`decode`](super::decode).
pub fn decode_par(
    raw: RawPrediction<'_>,
    anchors: &AnchorTable,
    cfg: &DetectorConfig,
    aspect_ratio: f32,
) -> AnchorDetResult<Vec<Detection>> {
    let Some(params) = DecodeParams::new(&raw, cfg, aspect_ratio)? else {
        return Ok(Vec::new());
    };
    let _span = trace_span!("decode_par", anchors = raw.num_anchors()).entered();
    warn_on_anchor_mismatch(anchors, &raw);

    let chunks: Vec<Vec<Detection>> = raw
        .boxes
        .par_chunks(params.stride * CHUNK_ANCHORS)
        .zip(raw.scores.par_chunks(CHUNK_ANCHORS))
        .enumerate()
        .map(|(chunk_idx, (rows, logits))| {
            let base = chunk_idx * CHUNK_ANCHORS;
            rows.chunks_exact(params.stride)
                .zip(logits.iter())
                .enumerate()
                .filter_map(|(offset, (row, &logit))| {
                    let idx = base + offset;
                    decode_anchor(idx, row, logit, anchors.get_or_identity(idx), &params)
                })
                .collect()
        })
        .collect();

    let detections: Vec<Detection> = chunks.into_iter().flatten().collect();
    trace_event!("decoded", candidates = detections.len());
    Ok(detections)
}

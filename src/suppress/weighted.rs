//! Score-weighted cluster averaging.
//!
//! Selection and removal follow the greedy pass, but the kept detection's box
//! and keypoints become the score-weighted mean over the cluster it removes
//! (itself included). Its score is left unchanged. Keypoints are averaged only
//! across cluster members with the same keypoint count as the kept one.

use crate::detection::{Detection, Keypoint};
use crate::suppress::first_max_index;
use crate::trace::{trace_event, trace_span};

fn weighted_mean(best: &Detection, cluster: &[Detection]) -> Detection {
    let total: f32 = best.score + cluster.iter().map(|d| d.score).sum::<f32>();
    if !(total.is_finite() && total > 0.0) {
        return best.clone();
    }

    let mut x_min = 0.0f32;
    let mut y_min = 0.0f32;
    let mut x_max = 0.0f32;
    let mut y_max = 0.0f32;
    let mut keypoints = vec![Keypoint::default(); best.keypoints.len()];
    let mut kp_total = 0.0f32;

    for det in std::iter::once(best).chain(cluster.iter()) {
        let w = det.score;
        x_min += det.x_min() * w;
        y_min += det.y_min() * w;
        x_max += det.x_max() * w;
        y_max += det.y_max() * w;
        if det.keypoints.len() == keypoints.len() {
            for (acc, kp) in keypoints.iter_mut().zip(det.keypoints.iter()) {
                acc.x += kp.x * w;
                acc.y += kp.y * w;
            }
            kp_total += w;
        }
    }

    x_min /= total;
    y_min /= total;
    x_max /= total;
    y_max /= total;
    if kp_total > 0.0 {
        for kp in keypoints.iter_mut() {
            kp.x /= kp_total;
            kp.y /= kp_total;
        }
    } else {
        keypoints.clone_from(&best.keypoints);
    }

    Detection {
        x_center: (x_min + x_max) / 2.0,
        y_center: (y_min + y_max) / 2.0,
        width: x_max - x_min,
        height: y_max - y_min,
        score: best.score,
        keypoints,
    }
}

/// Greedy suppression that replaces each kept box with its cluster's
/// score-weighted mean.
///
/// Unlike [`suppress`](super::suppress), surviving boxes are not guaranteed to
/// be pairwise below the threshold, since averaging moves them.
pub fn suppress_weighted(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let _span = trace_span!("suppress_weighted", candidates = detections.len()).entered();
    let mut candidates = detections;
    let mut kept = Vec::new();

    while let Some(idx) = first_max_index(&candidates) {
        let best = candidates.remove(idx);
        let (cluster, rest): (Vec<Detection>, Vec<Detection>) = candidates
            .into_iter()
            .partition(|det| best.iou(det) > iou_threshold);
        candidates = rest;
        kept.push(if cluster.is_empty() {
            best
        } else {
            weighted_mean(&best, &cluster)
        });
    }

    trace_event!("suppressed", kept = kept.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::suppress_weighted;
    use crate::detection::{Detection, Keypoint};

    #[test]
    fn cluster_is_averaged_by_score() {
        let a = Detection::new(0.50, 0.5, 0.2, 0.2, 0.75)
            .with_keypoints(vec![Keypoint::new(0.4, 0.4)]);
        let b = Detection::new(0.54, 0.5, 0.2, 0.2, 0.25)
            .with_keypoints(vec![Keypoint::new(0.8, 0.4)]);
        let out = suppress_weighted(vec![b, a], 0.3);
        assert_eq!(out.len(), 1);
        let det = &out[0];
        assert!((det.x_center - 0.51).abs() < 1e-5);
        assert!((det.width - 0.2).abs() < 1e-5);
        assert_eq!(det.score, 0.75);
        assert!((det.keypoints[0].x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn isolated_detection_is_unchanged() {
        let a = Detection::new(0.2, 0.2, 0.1, 0.1, 0.9);
        let b = Detection::new(0.8, 0.8, 0.1, 0.1, 0.8);
        let out = suppress_weighted(vec![a.clone(), b.clone()], 0.3);
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn keypoints_average_only_over_matching_counts() {
        let best = Detection::new(0.5, 0.5, 0.2, 0.2, 0.6)
            .with_keypoints(vec![Keypoint::new(0.4, 0.4); 7]);
        let bare = Detection::new(0.5, 0.5, 0.2, 0.2, 0.2);
        let full = Detection::new(0.5, 0.5, 0.2, 0.2, 0.2)
            .with_keypoints(vec![Keypoint::new(0.8, 0.6); 7]);
        let out = suppress_weighted(vec![bare, best, full], 0.3);
        assert_eq!(out.len(), 1);
        let det = &out[0];
        assert_eq!(det.score, 0.6);
        assert!((det.x_center - 0.5).abs() < 1e-5);
        assert!((det.width - 0.2).abs() < 1e-5);
        assert_eq!(det.keypoints.len(), 7);
        for kp in &det.keypoints {
            // (0.4 * 0.6 + 0.8 * 0.2) / 0.8, the keypoint-less member is skipped.
            assert!((kp.x - 0.5).abs() < 1e-5);
            assert!((kp.y - 0.45).abs() < 1e-5);
        }
    }

    #[test]
    fn keypoint_less_winner_stays_keypoint_less() {
        let best = Detection::new(0.5, 0.5, 0.2, 0.2, 0.9);
        let other = Detection::new(0.5, 0.5, 0.2, 0.2, 0.3)
            .with_keypoints(vec![Keypoint::new(0.1, 0.1); 7]);
        let out = suppress_weighted(vec![other, best], 0.3);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 0.9);
        assert!(out[0].keypoints.is_empty());
    }
}

//! Numeric helpers shared by the decoder and the suppressor.

/// Logistic sigmoid of a logit clamped to `[-clamp, clamp]`.
pub(crate) fn clamped_sigmoid(logit: f32, clamp: f32) -> f32 {
    let x = logit.clamp(-clamp, clamp);
    1.0 / (1.0 + (-x).exp())
}

/// Length of the overlap between the intervals `[a0, a1]` and `[b0, b1]`.
///
/// Never negative: disjoint intervals overlap by zero.
pub(crate) fn overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

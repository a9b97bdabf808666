#![cfg(feature = "rayon")]

use anchordet::lowlevel::{decode, decode_par};
use anchordet::{AnchorTable, DetectorConfig, ModelPreset, RawPrediction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn parallel_decode_matches_sequential() {
    let preset = ModelPreset::PalmDetectionFull;
    let anchors = AnchorTable::generate(&preset.anchor_options()).unwrap();
    let n = anchors.len();
    let d = preset.values_per_anchor();

    let mut rng = StdRng::seed_from_u64(5);
    let boxes: Vec<f32> = (0..n * d).map(|_| rng.random_range(-96.0..96.0)).collect();
    let scores: Vec<f32> = (0..n).map(|_| rng.random_range(-4.0..4.0)).collect();
    let cfg = DetectorConfig {
        min_score_threshold: 0.5,
        ..preset.detector_config()
    };
    let raw = RawPrediction::new(&boxes, &scores);

    let seq = decode(raw, &anchors, &cfg, 0.75).unwrap();
    let par = decode_par(raw, &anchors, &cfg, 0.75).unwrap();

    assert!(!seq.is_empty());
    assert_eq!(seq, par);
}

#[test]
fn parallel_decode_keeps_identity_fallback() {
    let anchors = AnchorTable::from_rows(vec![[0.5, 0.5, 1.0, 1.0]; 300]);
    let boxes = vec![64.0f32; 600 * 4];
    let scores = vec![5.0f32; 600];
    let cfg = DetectorConfig::default();
    let raw = RawPrediction::new(&boxes, &scores);

    let seq = decode(raw, &anchors, &cfg, 1.0).unwrap();
    let par = decode_par(raw, &anchors, &cfg, 1.0).unwrap();

    assert_eq!(seq.len(), 600);
    assert_eq!(seq, par);
    assert!((par[299].x_center - 1.0).abs() < 1e-6);
    assert!((par[300].x_center - 0.5).abs() < 1e-6);
}

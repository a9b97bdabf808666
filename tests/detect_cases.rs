//! Table-driven checks of `Detector::detect` against hand-computed outputs
//! stored in `tests/data/detect_cases.json`.

use anchordet::{AnchorTable, Detector, DetectorConfig, RawPrediction};
use serde::Deserialize;

const CASES_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/data/detect_cases.json"
));

const TOLERANCE: f32 = 1e-5;

#[derive(Debug, Deserialize)]
struct CaseFile {
    cases: Vec<Case>,
}

/// Overrides applied on top of `DetectorConfig::default()`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetectorOverrides {
    min_score_threshold: Option<f32>,
    iou_suppression_threshold: Option<f32>,
}

impl DetectorOverrides {
    fn apply(&self, mut cfg: DetectorConfig) -> DetectorConfig {
        if let Some(v) = self.min_score_threshold {
            cfg.min_score_threshold = v;
        }
        if let Some(v) = self.iou_suppression_threshold {
            cfg.iou_suppression_threshold = v;
        }
        cfg
    }
}

#[derive(Debug, Deserialize)]
struct Expected {
    x_center: f32,
    y_center: f32,
    width: f32,
    height: f32,
    score: f32,
}

fn default_aspect_ratio() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct Case {
    case_id: String,
    anchors: Vec<[f32; 4]>,
    boxes: Vec<f32>,
    scores: Vec<f32>,
    #[serde(default = "default_aspect_ratio")]
    aspect_ratio: f32,
    #[serde(default)]
    detector: DetectorOverrides,
    expected: Vec<Expected>,
}

fn run_case(case: &Case) -> Result<(), String> {
    let cfg = case.detector.apply(DetectorConfig::default());
    let detector = Detector::new(AnchorTable::from_rows(case.anchors.clone()), cfg)
        .map_err(|e| format!("invalid detector: {e}"))?;
    let out = detector
        .detect(
            RawPrediction::new(&case.boxes, &case.scores),
            case.aspect_ratio,
        )
        .map_err(|e| format!("detect failed: {e}"))?;

    if out.len() != case.expected.len() {
        return Err(format!(
            "expected {} detections, got {}",
            case.expected.len(),
            out.len()
        ));
    }
    for (i, (det, want)) in out.iter().zip(case.expected.iter()).enumerate() {
        let fields = [
            ("x_center", det.x_center, want.x_center),
            ("y_center", det.y_center, want.y_center),
            ("width", det.width, want.width),
            ("height", det.height, want.height),
            ("score", det.score, want.score),
        ];
        for (name, got, want) in fields {
            if (got - want).abs() > TOLERANCE {
                return Err(format!("detection {i}: {name} = {got}, expected {want}"));
            }
        }
    }
    Ok(())
}

#[test]
fn json_cases_match_expected_detections() {
    let file: CaseFile = serde_json::from_str(CASES_JSON).expect("failed to parse cases");
    assert!(!file.cases.is_empty());

    let failures: Vec<String> = file
        .cases
        .iter()
        .filter_map(|case| run_case(case).err().map(|e| format!("{}: {e}", case.case_id)))
        .collect();
    assert!(failures.is_empty(), "failing cases:\n{}", failures.join("\n"));
}

use anchordet::anchor::{load_anchor_file, ElementType};
use anchordet::{
    AnchorTable, Detection, Detector, DetectorConfig, ModelPreset, RawPrediction, SuppressionMode,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "anchordet CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DtypeConfig {
    F32,
    #[default]
    F64,
}

impl From<DtypeConfig> for ElementType {
    fn from(value: DtypeConfig) -> Self {
        match value {
            DtypeConfig::F32 => ElementType::F32,
            DtypeConfig::F64 => ElementType::F64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SuppressionConfig {
    Greedy,
    WeightedAverage,
}

impl From<SuppressionConfig> for SuppressionMode {
    fn from(value: SuppressionConfig) -> Self {
        match value {
            SuppressionConfig::Greedy => SuppressionMode::Greedy,
            SuppressionConfig::WeightedAverage => SuppressionMode::WeightedAverage,
        }
    }
}

/// Overrides applied on top of the preset (or default) detector config.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetectorConfigJson {
    min_score_threshold: Option<f32>,
    score_clamp: Option<f32>,
    iou_suppression_threshold: Option<f32>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    suppression: Option<SuppressionConfig>,
}

impl DetectorConfigJson {
    fn apply(self, mut cfg: DetectorConfig) -> DetectorConfig {
        if let Some(v) = self.min_score_threshold {
            cfg.min_score_threshold = v;
        }
        if let Some(v) = self.score_clamp {
            cfg.score_clamp = v;
        }
        if let Some(v) = self.iou_suppression_threshold {
            cfg.iou_suppression_threshold = v;
        }
        if let Some(v) = self.input_width {
            cfg.input_width = v;
        }
        if let Some(v) = self.input_height {
            cfg.input_height = v;
        }
        if let Some(v) = self.suppression {
            cfg.suppression = v.into();
        }
        cfg
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    preset: Option<String>,
    anchors_path: Option<String>,
    anchors_dtype: DtypeConfig,
    prediction_path: String,
    aspect_ratio: f32,
    output_path: Option<String>,
    detector: DetectorConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: None,
            anchors_path: None,
            anchors_dtype: DtypeConfig::default(),
            prediction_path: String::new(),
            aspect_ratio: 1.0,
            output_path: None,
            detector: DetectorConfigJson::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    boxes: Vec<f32>,
    scores: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    x_center: f32,
    y_center: f32,
    width: f32,
    height: f32,
    score: f32,
    keypoints: Vec<[f32; 2]>,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            x_center: value.x_center,
            y_center: value.y_center,
            width: value.width,
            height: value.height,
            score: value.score,
            keypoints: value.keypoints.iter().map(|kp| [kp.x, kp.y]).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    detections: Vec<DetectionRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("anchordet=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.prediction_path.is_empty() {
        return Err("prediction_path must be set in the config".into());
    }

    let preset = config
        .preset
        .as_deref()
        .map(str::parse::<ModelPreset>)
        .transpose()?;

    let anchors = match (&config.anchors_path, preset) {
        (Some(path), _) => load_anchor_file(path, config.anchors_dtype.into())?,
        (None, Some(preset)) => AnchorTable::generate(&preset.anchor_options())?,
        (None, None) => return Err("either preset or anchors_path must be set".into()),
    };
    tracing::info!(anchors = anchors.len(), "anchor table ready");

    let base = preset
        .map(ModelPreset::detector_config)
        .unwrap_or_default();
    let detector = Detector::new(anchors, config.detector.apply(base))?;

    let prediction_text = fs::read_to_string(&config.prediction_path)?;
    let prediction: Prediction = serde_json::from_str(&prediction_text)?;
    let raw = RawPrediction::new(&prediction.boxes, &prediction.scores);

    let detections = detector.detect(raw, config.aspect_ratio)?;
    let output = Output {
        count: detections.len(),
        detections: detections.into_iter().map(DetectionRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

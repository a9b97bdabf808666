//! Detector configuration and named model presets.

use crate::anchor::AnchorOptions;
use crate::util::{AnchorDetError, AnchorDetResult};
use std::fmt;
use std::str::FromStr;

/// How overlapping detections are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuppressionMode {
    /// Keep the highest-scoring box and drop every box overlapping it.
    #[default]
    Greedy,
    /// Keep the highest-scoring box but replace its geometry with the
    /// score-weighted mean of the cluster it suppresses.
    WeightedAverage,
}

/// Decode and suppression parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Detections below this sigmoid score are discarded.
    pub min_score_threshold: f32,
    /// Logits are clamped to `[-score_clamp, score_clamp]` before the sigmoid.
    pub score_clamp: f32,
    /// Candidates overlapping a kept box by more than this IoU are suppressed.
    pub iou_suppression_threshold: f32,
    /// Width the network ran at, in pixels.
    pub input_width: u32,
    /// Height the network ran at, in pixels.
    pub input_height: u32,
    /// Suppression strategy.
    pub suppression: SuppressionMode,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_score_threshold: 0.75,
            score_clamp: 100.0,
            iou_suppression_threshold: 0.3,
            input_width: 128,
            input_height: 128,
            suppression: SuppressionMode::Greedy,
        }
    }
}

impl DetectorConfig {
    /// Checks that the configuration can be used for decoding.
    pub fn validate(&self) -> AnchorDetResult<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(AnchorDetError::InvalidDimensions {
                width: self.input_width,
                height: self.input_height,
            });
        }
        if !self.min_score_threshold.is_finite() {
            return Err(AnchorDetError::InvalidConfig {
                field: "min_score_threshold",
                reason: "must be finite",
            });
        }
        if self.score_clamp.is_nan() || self.score_clamp < 0.0 {
            return Err(AnchorDetError::InvalidConfig {
                field: "score_clamp",
                reason: "must be non-negative",
            });
        }
        if !self.iou_suppression_threshold.is_finite() {
            return Err(AnchorDetError::InvalidConfig {
                field: "iou_suppression_threshold",
                reason: "must be finite",
            });
        }
        Ok(())
    }
}

/// Known detector networks and their post-processing constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelPreset {
    /// BlazePalm at 128x128, 896 anchors, 7 keypoints.
    PalmDetection,
    /// Full-range palm detector at 192x192, 2016 anchors, 7 keypoints.
    PalmDetectionFull,
    /// Front-camera BlazeFace at 128x128, 896 anchors, 6 keypoints.
    BlazeFaceFront,
    /// Back-camera BlazeFace at 256x256, 896 anchors, 6 keypoints.
    BlazeFaceBack,
}

struct PresetEntry {
    preset: ModelPreset,
    name: &'static str,
    input: u32,
    min_scale: f32,
    strides: [u32; 4],
    keypoints: usize,
    min_score_threshold: f32,
}

static PRESETS: [PresetEntry; 4] = [
    PresetEntry {
        preset: ModelPreset::PalmDetection,
        name: "palm_detection",
        input: 128,
        min_scale: 0.148_437_5,
        strides: [8, 16, 16, 16],
        keypoints: 7,
        min_score_threshold: 0.75,
    },
    PresetEntry {
        preset: ModelPreset::PalmDetectionFull,
        name: "palm_detection_full",
        input: 192,
        min_scale: 0.148_437_5,
        strides: [8, 16, 16, 16],
        keypoints: 7,
        min_score_threshold: 0.5,
    },
    PresetEntry {
        preset: ModelPreset::BlazeFaceFront,
        name: "blazeface_front",
        input: 128,
        min_scale: 0.148_437_5,
        strides: [8, 16, 16, 16],
        keypoints: 6,
        min_score_threshold: 0.75,
    },
    PresetEntry {
        preset: ModelPreset::BlazeFaceBack,
        name: "blazeface_back",
        input: 256,
        min_scale: 0.156_25,
        strides: [16, 32, 32, 32],
        keypoints: 6,
        min_score_threshold: 0.65,
    },
];

impl ModelPreset {
    /// Every preset, in declaration order.
    pub const ALL: [ModelPreset; 4] = [
        ModelPreset::PalmDetection,
        ModelPreset::PalmDetectionFull,
        ModelPreset::BlazeFaceFront,
        ModelPreset::BlazeFaceBack,
    ];

    fn entry(self) -> &'static PresetEntry {
        match self {
            ModelPreset::PalmDetection => &PRESETS[0],
            ModelPreset::PalmDetectionFull => &PRESETS[1],
            ModelPreset::BlazeFaceFront => &PRESETS[2],
            ModelPreset::BlazeFaceBack => &PRESETS[3],
        }
    }

    /// Snake-case name used in config files.
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Number of keypoints the network regresses per anchor.
    pub fn num_keypoints(self) -> usize {
        self.entry().keypoints
    }

    /// Values per anchor in the regression tensor.
    pub fn values_per_anchor(self) -> usize {
        4 + 2 * self.num_keypoints()
    }

    /// Decode and suppression parameters for this network.
    pub fn detector_config(self) -> DetectorConfig {
        let e = self.entry();
        DetectorConfig {
            min_score_threshold: e.min_score_threshold,
            input_width: e.input,
            input_height: e.input,
            ..DetectorConfig::default()
        }
    }

    /// Anchor grid options this network was trained against.
    pub fn anchor_options(self) -> AnchorOptions {
        let e = self.entry();
        AnchorOptions {
            input_width: e.input,
            input_height: e.input,
            min_scale: e.min_scale,
            strides: e.strides.to_vec(),
            ..AnchorOptions::default()
        }
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelPreset {
    type Err = AnchorDetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PRESETS
            .iter()
            .find(|e| e.name == s)
            .map(|e| e.preset)
            .ok_or(AnchorDetError::InvalidInput("unknown model preset"))
    }
}

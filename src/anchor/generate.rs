//! SSD anchor generation.
//!
//! Builds the anchor grid used by BlazeFace/BlazePalm style networks. Layers
//! that share a stride are merged into one feature map, so each cell of that
//! map carries the anchors of every merged layer. Output order is layer group,
//! then row, then column, then anchor within the cell, which is the order the
//! network emits its regressions in.

use crate::anchor::Anchor;
use crate::util::{AnchorDetError, AnchorDetResult};

/// Parameters of an SSD anchor grid.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorOptions {
    /// Network input width in pixels.
    pub input_width: u32,
    /// Network input height in pixels.
    pub input_height: u32,
    /// Smallest anchor scale (first layer).
    pub min_scale: f32,
    /// Largest anchor scale (last layer).
    pub max_scale: f32,
    /// Cell-relative offset of anchor centers along x.
    pub anchor_offset_x: f32,
    /// Cell-relative offset of anchor centers along y.
    pub anchor_offset_y: f32,
    /// Stride of every output layer, one entry per layer.
    pub strides: Vec<u32>,
    /// Aspect ratios emitted per layer.
    pub aspect_ratios: Vec<f32>,
    /// Aspect ratio of the extra interpolated-scale anchor; `<= 0` disables it.
    pub interpolated_scale_aspect_ratio: f32,
    /// Emit unit-size anchors instead of scaled ones.
    pub fixed_anchor_size: bool,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            input_width: 128,
            input_height: 128,
            min_scale: 0.148_437_5,
            max_scale: 0.75,
            anchor_offset_x: 0.5,
            anchor_offset_y: 0.5,
            strides: vec![8, 16, 16, 16],
            aspect_ratios: vec![1.0],
            interpolated_scale_aspect_ratio: 1.0,
            fixed_anchor_size: true,
        }
    }
}

impl AnchorOptions {
    fn validate(&self) -> AnchorDetResult<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(AnchorDetError::InvalidDimensions {
                width: self.input_width,
                height: self.input_height,
            });
        }
        if self.strides.is_empty() {
            return Err(AnchorDetError::InvalidConfig {
                field: "strides",
                reason: "at least one layer is required",
            });
        }
        if self.strides.contains(&0) {
            return Err(AnchorDetError::InvalidConfig {
                field: "strides",
                reason: "strides must be positive",
            });
        }
        let bad_ratio = self.aspect_ratios.iter().any(|&r| r.is_nan() || r <= 0.0);
        if self.aspect_ratios.is_empty() || bad_ratio {
            return Err(AnchorDetError::InvalidConfig {
                field: "aspect_ratios",
                reason: "aspect ratios must be positive",
            });
        }
        Ok(())
    }

    /// Number of anchors `generate_anchors` will emit for these options.
    pub fn anchor_count(&self) -> usize {
        let per_layer = self.aspect_ratios.len()
            + usize::from(self.interpolated_scale_aspect_ratio > 0.0);
        let mut total = 0usize;
        let mut layer = 0usize;
        while layer < self.strides.len() {
            let stride = self.strides[layer];
            let group = self.strides[layer..]
                .iter()
                .take_while(|&&s| s == stride)
                .count();
            let (fw, fh) = self.feature_map_size(stride);
            total += fw * fh * per_layer * group;
            layer += group;
        }
        total
    }

    fn feature_map_size(&self, stride: u32) -> (usize, usize) {
        (
            self.input_width.div_ceil(stride) as usize,
            self.input_height.div_ceil(stride) as usize,
        )
    }

    fn scale_at(&self, layer: usize) -> f32 {
        let n = self.strides.len();
        if n == 1 {
            (self.min_scale + self.max_scale) * 0.5
        } else {
            self.min_scale + (self.max_scale - self.min_scale) * layer as f32 / (n - 1) as f32
        }
    }
}

/// Generates the anchor grid for `options`.
pub fn generate_anchors(options: &AnchorOptions) -> AnchorDetResult<Vec<Anchor>> {
    options.validate()?;

    let num_layers = options.strides.len();
    let mut anchors = Vec::with_capacity(options.anchor_count());
    let mut layer = 0usize;
    while layer < num_layers {
        let stride = options.strides[layer];
        let mut sizes: Vec<(f32, f32)> = Vec::new();

        let mut last = layer;
        while last < num_layers && options.strides[last] == stride {
            let scale = options.scale_at(last);
            for &ratio in &options.aspect_ratios {
                let root = ratio.sqrt();
                sizes.push((scale * root, scale / root));
            }
            if options.interpolated_scale_aspect_ratio > 0.0 {
                let next = if last == num_layers - 1 {
                    1.0
                } else {
                    options.scale_at(last + 1)
                };
                let interpolated = (scale * next).sqrt();
                let root = options.interpolated_scale_aspect_ratio.sqrt();
                sizes.push((interpolated * root, interpolated / root));
            }
            last += 1;
        }

        let (fw, fh) = options.feature_map_size(stride);
        for y in 0..fh {
            for x in 0..fw {
                let x_center = (x as f32 + options.anchor_offset_x) / fw as f32;
                let y_center = (y as f32 + options.anchor_offset_y) / fh as f32;
                for &(w, h) in &sizes {
                    anchors.push(if options.fixed_anchor_size {
                        Anchor::new(x_center, y_center, 1.0, 1.0)
                    } else {
                        Anchor::new(x_center, y_center, w, h)
                    });
                }
            }
        }

        layer = last;
    }

    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::{generate_anchors, AnchorOptions};

    #[test]
    fn single_layer_grid_is_row_major() {
        let options = AnchorOptions {
            input_width: 4,
            input_height: 4,
            strides: vec![2],
            interpolated_scale_aspect_ratio: 0.0,
            ..AnchorOptions::default()
        };
        let anchors = generate_anchors(&options).unwrap();
        assert_eq!(anchors.len(), 4);
        assert!((anchors[0].x_center - 0.25).abs() < 1e-6);
        assert!((anchors[1].x_center - 0.75).abs() < 1e-6);
        assert!((anchors[1].y_center - 0.25).abs() < 1e-6);
        assert!((anchors[2].y_center - 0.75).abs() < 1e-6);
    }

    #[test]
    fn scaled_anchors_use_layer_scale() {
        let options = AnchorOptions {
            input_width: 2,
            input_height: 2,
            strides: vec![2],
            min_scale: 0.2,
            max_scale: 0.4,
            interpolated_scale_aspect_ratio: 0.0,
            fixed_anchor_size: false,
            ..AnchorOptions::default()
        };
        let anchors = generate_anchors(&options).unwrap();
        assert_eq!(anchors.len(), 1);
        assert!((anchors[0].w - 0.3).abs() < 1e-6);
        assert!((anchors[0].h - 0.3).abs() < 1e-6);
    }

    #[test]
    fn rejects_zero_stride() {
        let options = AnchorOptions {
            strides: vec![8, 0],
            ..AnchorOptions::default()
        };
        assert!(generate_anchors(&options).is_err());
    }
}

//! Decoded detections in normalized image coordinates.

use crate::util::math::overlap;

/// A 2D landmark in the same normalized space as its detection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A decoded candidate: an axis-aligned box, a confidence and its landmarks.
///
/// Boxes are stored as center plus size. `width` and `height` are whatever the
/// network regressed; callers that need pixel rectangles clamp negative sizes
/// themselves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    /// Box center along x.
    pub x_center: f32,
    /// Box center along y, already corrected for the frame aspect ratio.
    pub y_center: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
    /// Sigmoid confidence in `[0, 1]`.
    pub score: f32,
    /// Keypoints in regression order.
    pub keypoints: Vec<Keypoint>,
}

impl Detection {
    /// Creates a detection without keypoints.
    pub fn new(x_center: f32, y_center: f32, width: f32, height: f32, score: f32) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
            score,
            keypoints: Vec::new(),
        }
    }

    /// Attaches keypoints, replacing any existing ones.
    pub fn with_keypoints(mut self, keypoints: Vec<Keypoint>) -> Self {
        self.keypoints = keypoints;
        self
    }

    pub fn x_min(&self) -> f32 {
        self.x_center - self.width / 2.0
    }

    pub fn y_min(&self) -> f32 {
        self.y_center - self.height / 2.0
    }

    pub fn x_max(&self) -> f32 {
        self.x_center + self.width / 2.0
    }

    pub fn y_max(&self) -> f32 {
        self.y_center + self.height / 2.0
    }

    /// Box area (`width * height`).
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over union with another box.
    ///
    /// Returns 0 when the boxes do not overlap or when the union is empty or
    /// non-finite, so the result is always a finite value in `[0, 1]` for
    /// well-formed boxes.
    pub fn iou(&self, other: &Detection) -> f32 {
        let ix = overlap(self.x_min(), self.x_max(), other.x_min(), other.x_max());
        let iy = overlap(self.y_min(), self.y_max(), other.y_min(), other.y_max());
        let intersection = ix * iy;
        if intersection <= 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - intersection;
        let iou = intersection / union;
        if union > 0.0 && iou.is_finite() {
            iou
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Detection;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = Detection::new(0.5, 0.5, 0.2, 0.2, 0.9);
        let b = Detection::new(0.5, 0.5, 0.2, 0.2, 0.8);
        assert!((a.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_half_shifted_boxes() {
        let a = Detection::new(0.5, 0.5, 1.0, 1.0, 0.9);
        let b = Detection::new(1.0, 0.5, 1.0, 1.0, 0.9);
        // intersection 0.5, union 1.5
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn iou_is_zero_for_disjoint_and_degenerate_boxes() {
        let a = Detection::new(0.2, 0.2, 0.1, 0.1, 0.9);
        let b = Detection::new(0.8, 0.8, 0.1, 0.1, 0.9);
        assert_eq!(a.iou(&b), 0.0);

        let point = Detection::new(0.2, 0.2, 0.0, 0.0, 0.9);
        assert_eq!(a.iou(&point), 0.0);
        assert_eq!(point.iou(&point), 0.0);
    }

    #[test]
    fn bounds_follow_center_and_size() {
        let det = Detection::new(0.5, 0.4, 0.2, 0.4, 1.0);
        assert!((det.x_min() - 0.4).abs() < 1e-6);
        assert!((det.x_max() - 0.6).abs() < 1e-6);
        assert!((det.y_min() - 0.2).abs() < 1e-6);
        assert!((det.y_max() - 0.6).abs() < 1e-6);
    }
}

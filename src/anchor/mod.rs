//! Fixed anchor tables.
//!
//! An anchor is the normalized reference box a detector's regression outputs
//! are expressed against. A table is built once (parsed from an asset or
//! generated from SSD options) and then shared read-only by every decode call;
//! cloning an `AnchorTable` only bumps a reference count.

mod generate;
mod io;

pub use generate::{generate_anchors, AnchorOptions};
pub use io::{load_anchor_file, ElementType};

use crate::util::{AnchorDetError, AnchorDetResult};
use std::ops::Deref;
use std::sync::Arc;

/// One anchor: center offset and scale in normalized `[0, 1]` space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    /// Center offset along x.
    pub x_center: f32,
    /// Center offset along y.
    pub y_center: f32,
    /// Width scale applied to regressed x values.
    pub w: f32,
    /// Height scale applied to regressed y values.
    pub h: f32,
}

impl Anchor {
    /// Anchor that leaves regressed values untouched: offset 0, scale 1.
    pub const IDENTITY: Anchor = Anchor {
        x_center: 0.0,
        y_center: 0.0,
        w: 1.0,
        h: 1.0,
    };

    pub fn new(x_center: f32, y_center: f32, w: f32, h: f32) -> Self {
        Self {
            x_center,
            y_center,
            w,
            h,
        }
    }
}

impl From<[f32; 4]> for Anchor {
    fn from(v: [f32; 4]) -> Self {
        Anchor::new(v[0], v[1], v[2], v[3])
    }
}

/// Immutable, shareable anchor table.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorTable {
    anchors: Arc<[Anchor]>,
}

impl AnchorTable {
    /// Wraps a list of anchors.
    pub fn new(anchors: Vec<Anchor>) -> Self {
        Self {
            anchors: anchors.into(),
        }
    }

    /// Builds a table from `[x_center, y_center, w, h]` rows.
    pub fn from_rows(rows: Vec<[f32; 4]>) -> Self {
        Self::new(rows.into_iter().map(Anchor::from).collect())
    }

    /// Builds a table from a flat array, four values per anchor.
    pub fn from_values(values: &[f32]) -> AnchorDetResult<Self> {
        if values.len() % 4 != 0 {
            return Err(AnchorDetError::InvalidInput(
                "anchor value count must be a multiple of 4",
            ));
        }
        let anchors = values
            .chunks_exact(4)
            .map(|c| Anchor::new(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self::new(anchors))
    }

    /// Parses a little-endian numeric array asset.
    pub fn from_le_bytes(bytes: &[u8], ty: ElementType) -> AnchorDetResult<Self> {
        let values = io::parse_le_values(bytes, ty)?;
        Self::from_values(&values)
    }

    /// Generates the SSD anchor grid described by `options`.
    pub fn generate(options: &AnchorOptions) -> AnchorDetResult<Self> {
        Ok(Self::new(generate_anchors(options)?))
    }

    /// Returns the anchor at `idx`, or the identity anchor past the end.
    pub fn get_or_identity(&self, idx: usize) -> Anchor {
        self.anchors.get(idx).copied().unwrap_or(Anchor::IDENTITY)
    }

    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors
    }
}

impl Deref for AnchorTable {
    type Target = [Anchor];

    fn deref(&self) -> &[Anchor] {
        &self.anchors
    }
}

#[cfg(test)]
mod tests {
    use super::{Anchor, AnchorTable};

    #[test]
    fn missing_anchors_fall_back_to_identity() {
        let table = AnchorTable::from_rows(vec![[0.25, 0.75, 1.0, 1.0]]);
        assert_eq!(table.get_or_identity(0), Anchor::new(0.25, 0.75, 1.0, 1.0));
        assert_eq!(table.get_or_identity(1), Anchor::IDENTITY);
    }

    #[test]
    fn clones_share_storage() {
        let table = AnchorTable::from_rows(vec![[0.5, 0.5, 1.0, 1.0]; 3]);
        let other = table.clone();
        assert!(std::ptr::eq(table.as_slice(), other.as_slice()));
    }

    #[test]
    fn flat_values_must_form_whole_anchors() {
        assert!(AnchorTable::from_values(&[0.0; 6]).is_err());
        let table = AnchorTable::from_values(&[0.1, 0.2, 1.0, 1.0, 0.3, 0.4, 1.0, 1.0]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1], Anchor::new(0.3, 0.4, 1.0, 1.0));
    }
}

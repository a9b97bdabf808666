//! Parsing of flat numeric anchor assets.
//!
//! Anchor assets are plain little-endian arrays, four values per anchor, with
//! no header.

use crate::anchor::AnchorTable;
use crate::util::{AnchorDetError, AnchorDetResult};
use std::path::Path;

/// Element type of a numeric anchor asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ElementType {
    F32,
    #[default]
    F64,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }
}

pub(crate) fn parse_le_values(bytes: &[u8], ty: ElementType) -> AnchorDetResult<Vec<f32>> {
    if bytes.len() % ty.size() != 0 {
        return Err(AnchorDetError::InvalidInput(
            "anchor asset length is not a multiple of the element size",
        ));
    }
    let values = match ty {
        ElementType::F32 => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        ElementType::F64 => bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
    };
    Ok(values)
}

/// Reads and parses an anchor asset from disk.
pub fn load_anchor_file<P: AsRef<Path>>(path: P, ty: ElementType) -> AnchorDetResult<AnchorTable> {
    let bytes = std::fs::read(path).map_err(|err| AnchorDetError::Io {
        reason: err.to_string(),
    })?;
    AnchorTable::from_le_bytes(&bytes, ty)
}

// src/labels.rs - Node type flags and the label raster produced by classification

use serde::{Deserialize, Serialize};

/// Skeleton pixel with at most one neighbourhood transition (a line end)
pub const TERMINUS: u8 = 1;
/// Skeleton pixel with exactly two transitions (mid-line)
pub const EDGE: u8 = 2;
/// Skeleton pixel with three or more transitions (branch point)
pub const JUNCTION: u8 = 4;
/// Transient "already consumed by a traced line" marker
pub const PROCESSED: u8 = 8;

pub const LINE: u8 = TERMINUS | EDGE;
pub const NODE: u8 = TERMINUS | JUNCTION;
pub const SKELETON: u8 = EDGE | NODE;

/// Node category of a labelled pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Terminus,
    Edge,
    Junction,
}

impl NodeKind {
    /// Category of a label byte, ignoring the PROCESSED overlay
    pub fn from_label(label: u8) -> Option<Self> {
        match label & SKELETON {
            TERMINUS => Some(NodeKind::Terminus),
            EDGE => Some(NodeKind::Edge),
            JUNCTION => Some(NodeKind::Junction),
            _ => None,
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            NodeKind::Terminus => TERMINUS,
            NodeKind::Edge => EDGE,
            NodeKind::Junction => JUNCTION,
        }
    }
}

/// One label byte per pixel, row-major, using the flags above
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl LabelRaster {
    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn label(&self, index: usize) -> u8 {
        self.data[index]
    }

    #[inline]
    pub fn label_at(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn kind_at(&self, x: u32, y: u32) -> Option<NodeKind> {
        NodeKind::from_label(self.label_at(x, y))
    }

    /// Number of pixels carrying the given node category
    pub fn count(&self, kind: NodeKind) -> usize {
        let flag = kind.flag();
        self.data.iter().filter(|&&l| l & SKELETON == flag).count()
    }

    /// Flattened indices of all pixels of the given category, in raster order
    pub fn indices_of(&self, kind: NodeKind) -> Vec<usize> {
        let flag = kind.flag();
        self.data
            .iter()
            .enumerate()
            .filter(|(_, l)| **l & SKELETON == flag)
            .map(|(i, _)| i)
            .collect()
    }

    /// True when no pixel is on the skeleton
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&l| l == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_ignores_processed_overlay() {
        assert_eq!(NodeKind::from_label(EDGE | PROCESSED), Some(NodeKind::Edge));
        assert_eq!(NodeKind::from_label(JUNCTION), Some(NodeKind::Junction));
        assert_eq!(NodeKind::from_label(PROCESSED), None);
        assert_eq!(NodeKind::from_label(0), None);
    }

    #[test]
    fn derived_masks() {
        assert_eq!(LINE, 3);
        assert_eq!(NODE, 5);
        assert_eq!(SKELETON, 7);
    }

    #[test]
    fn counts_by_kind() {
        let labels = LabelRaster::from_parts(4, 1, vec![TERMINUS, EDGE, EDGE, TERMINUS]);
        assert_eq!(labels.count(NodeKind::Terminus), 2);
        assert_eq!(labels.count(NodeKind::Edge), 2);
        assert_eq!(labels.indices_of(NodeKind::Terminus), vec![0, 3]);
        assert!(!labels.is_blank());
    }
}

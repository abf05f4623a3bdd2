// src/classifier.rs - Terminus / edge / junction labelling of skeleton pixels

use crate::labels::{LabelRaster, EDGE, JUNCTION, TERMINUS};
use crate::neighbourhood::{Neighbourhood, DIRECTIONS};
use crate::raster::BinaryRaster;

/// Count background -> foreground transitions around the pixel at `index`.
///
/// The 8 neighbours are walked in cyclic direction order, wrapping back to the
/// first one. Neighbours outside the grid count as background.
pub fn transitions(skeleton: &BinaryRaster, geometry: &Neighbourhood, index: usize) -> u32 {
    let occupied = |d: u8| {
        geometry
            .neighbour(index, d)
            .map_or(false, |n| skeleton.is_foreground(n))
    };

    let mut count = 0;
    let mut previous = occupied(DIRECTIONS - 1);
    for d in 0..DIRECTIONS {
        let current = occupied(d);
        if !previous && current {
            count += 1;
        }
        previous = current;
    }
    count
}

/// Label for a foreground pixel with the given transition count
#[inline]
pub fn label_for(transitions: u32) -> u8 {
    match transitions {
        0 | 1 => TERMINUS,
        2 => EDGE,
        _ => JUNCTION,
    }
}

/// Label every foreground pixel of a skeleton.
///
/// Pure function of the raster; rerun it after any pixel is deleted since one
/// deletion changes the transition count of up to eight neighbours.
pub fn classify(skeleton: &BinaryRaster) -> LabelRaster {
    let (width, height) = skeleton.dimensions();
    let geometry = Neighbourhood::new(width, height);

    let data = (0..skeleton.len())
        .map(|index| {
            if skeleton.is_foreground(index) {
                label_for(transitions(skeleton, &geometry, index))
            } else {
                0
            }
        })
        .collect();

    LabelRaster::from_parts(width, height, data)
}

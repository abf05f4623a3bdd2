// src/thinning.rs - Reduction of binary shapes to one-pixel-wide 8-connected skeletons

use crate::classifier::transitions;
use crate::neighbourhood::{is_diagonal, Neighbourhood, DIRECTIONS};
use crate::raster::BinaryRaster;

/// Anything able to thin a binary raster down to a skeleton
pub trait Skeletonize {
    fn skeletonize(&self, raster: &BinaryRaster) -> BinaryRaster;
}

/// Input is already a skeleton; pass it through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Skeletonize for Identity {
    fn skeletonize(&self, raster: &BinaryRaster) -> BinaryRaster {
        raster.clone()
    }
}

/// Zhang-Suen parallel thinning, two sub-iterations per pass until stable.
///
/// The parallel passes can leave staircase corners and small clusters that
/// are two pixels thick. A sequential sweep then drops every pixel whose
/// removal keeps the 8-connected topology intact and which is not the end of
/// a line, so that each remaining pixel classifies as a terminus, an edge or
/// a genuine junction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZhangSuen;

// Neighbour directions in the E, S, W, N sense used by the deletion rules
const EAST: u8 = 0;
const SOUTH: u8 = 2;
const WEST: u8 = 4;
const NORTH: u8 = 6;

impl ZhangSuen {
    /// Mark removable pixels for one sub-iteration without modifying the raster
    fn removable(&self, raster: &BinaryRaster, geometry: &Neighbourhood, first_pass: bool) -> Vec<usize> {
        let on = |index: usize, direction: u8| {
            geometry
                .neighbour(index, direction)
                .map_or(false, |n| raster.is_foreground(n))
        };

        (0..raster.len())
            .filter(|&index| raster.is_foreground(index))
            .filter(|&index| {
                let neighbours = (0..DIRECTIONS).filter(|&d| on(index, d)).count();
                if !(2..=6).contains(&neighbours) {
                    return false;
                }
                if transitions(raster, geometry, index) != 1 {
                    return false;
                }

                let (n, e, s, w) = (on(index, NORTH), on(index, EAST), on(index, SOUTH), on(index, WEST));
                if first_pass {
                    !(n && e && s) && !(e && s && w)
                } else {
                    !(n && e && w) && !(n && s && w)
                }
            })
            .collect()
    }

    /// Yokoi 8-connectivity number: how many 8-connected foreground groups
    /// meet at the pixel
    fn connectivity_number(raster: &BinaryRaster, geometry: &Neighbourhood, index: usize) -> usize {
        let off = |direction: u8| {
            !geometry
                .neighbour(index, direction % DIRECTIONS)
                .map_or(false, |n| raster.is_foreground(n))
        };
        [EAST, SOUTH, WEST, NORTH]
            .into_iter()
            .filter(|&k| off(k) && !(off(k + 1) && off(k + 2)))
            .count()
    }

    /// A pixel that can go without splitting or shortening the skeleton
    fn is_redundant(raster: &BinaryRaster, geometry: &Neighbourhood, index: usize) -> bool {
        if Self::connectivity_number(raster, geometry, index) != 1 {
            return false;
        }
        let occupied: Vec<u8> = (0..DIRECTIONS)
            .filter(|&d| {
                geometry
                    .neighbour(index, d)
                    .map_or(false, |n| raster.is_foreground(n))
            })
            .collect();
        match occupied.len() {
            0 | 1 => false,
            // Inner corner of a staircase
            2 => occupied.iter().all(|&d| !is_diagonal(d)),
            _ => true,
        }
    }

    /// Remove redundant pixels one at a time in raster order until none is left
    fn clean_up(&self, skeleton: &mut BinaryRaster, geometry: &Neighbourhood) {
        loop {
            let mut changed = false;
            for index in 0..skeleton.len() {
                if skeleton.is_foreground(index) && Self::is_redundant(skeleton, geometry, index) {
                    skeleton.set(index, false);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}

impl Skeletonize for ZhangSuen {
    fn skeletonize(&self, raster: &BinaryRaster) -> BinaryRaster {
        let (width, height) = raster.dimensions();
        let geometry = Neighbourhood::new(width, height);
        let mut skeleton = raster.clone();

        loop {
            let mut changed = false;
            for first_pass in [true, false] {
                let removable = self.removable(&skeleton, &geometry, first_pass);
                changed |= !removable.is_empty();
                for index in removable {
                    skeleton.set(index, false);
                }
            }
            if !changed {
                break;
            }
        }
        self.clean_up(&mut skeleton, &geometry);

        skeleton
    }
}

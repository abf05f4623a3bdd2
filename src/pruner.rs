// src/pruner.rs - Iterative removal of short branches at over-connected junctions

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{debug, warn};

use crate::chain_code::ChainCode;
use crate::classifier::classify;
use crate::errors::{Result, SkeletonError};
use crate::labels::{LabelRaster, NodeKind, JUNCTION, SKELETON};
use crate::raster::BinaryRaster;
use crate::tracer::{extract_lines, Line};

/// A junction keeps at least this many attachments
const MIN_JUNCTION_BRANCHES: usize = 2;

/// One line seen from a junction it touches, oriented outward from that junction
#[derive(Debug, Clone)]
pub struct Branch {
    pub junction: usize,
    /// The line's other endpoint
    pub far_end: usize,
    /// Category of `far_end`; only a terminus makes a branch deletable
    pub far_kind: Option<NodeKind>,
    pub length: f64,
    /// Origin is the junction pixel
    pub chain_code: ChainCode,
    /// Both endpoints are junctions
    pub internal: bool,
}

/// Result of a pruning run
#[derive(Debug, Clone)]
pub struct PruneOutcome {
    /// Skeleton with all pruned branches set to background
    pub skeleton: BinaryRaster,
    /// Labels of the final skeleton
    pub labels: LabelRaster,
    /// Lines of the final skeleton, sorted as by `extract_lines`
    pub lines: Vec<Line>,
    pub iterations: usize,
    pub removed_branches: usize,
    pub removed_pixels: usize,
    /// False when the iteration bound stopped the run before a fixpoint
    pub converged: bool,
}

/// Longer first; equal lengths keep the branch whose far end has the lower index
fn rank(a: &Branch, b: &Branch) -> Ordering {
    b.length
        .total_cmp(&a.length)
        .then(a.far_end.cmp(&b.far_end))
}

/// Shorter first; equal lengths prefer the lower far-end index
fn shortest_first(a: &Branch, b: &Branch) -> Ordering {
    a.length
        .total_cmp(&b.length)
        .then(a.far_end.cmp(&b.far_end))
}

/// Record every line under each junction it touches.
pub fn collect_branches(labels: &LabelRaster, lines: &[Line]) -> BTreeMap<usize, Vec<Branch>> {
    let is_junction = |index: usize| labels.label(index) & SKELETON == JUNCTION;
    let mut groups: BTreeMap<usize, Vec<Branch>> = BTreeMap::new();

    for line in lines {
        let start_junction = is_junction(line.start);
        let end_junction = is_junction(line.end);
        let internal = start_junction && end_junction;

        if end_junction {
            groups.entry(line.end).or_default().push(Branch {
                junction: line.end,
                far_end: line.start,
                far_kind: NodeKind::from_label(labels.label(line.start)),
                length: line.length,
                chain_code: line.chain_code.reversed(),
                internal,
            });
        }
        if start_junction {
            groups.entry(line.start).or_default().push(Branch {
                junction: line.start,
                far_end: line.end,
                far_kind: NodeKind::from_label(labels.label(line.end)),
                length: line.length,
                chain_code: line.chain_code.clone(),
                internal,
            });
        }
    }

    groups
}

/// Each neighbour of a junction carries at most one branch, and a branch
/// that does not join two junctions must end on a terminus.
fn check_junction(junction: usize, branches: &[Branch]) -> Result<()> {
    let mut seen = 0u8;
    for branch in branches {
        let direction = branch.chain_code.first_direction().ok_or_else(|| {
            SkeletonError::InconsistentTopology {
                index: junction,
                detail: "empty branch recorded at junction".to_string(),
            }
        })?;
        if seen & (1 << direction) != 0 {
            return Err(SkeletonError::InconsistentTopology {
                index: junction,
                detail: format!(
                    "{} branches recorded, direction {} traversed twice",
                    branches.len(),
                    direction
                ),
            });
        }
        seen |= 1 << direction;

        if !branch.internal && branch.far_kind != Some(NodeKind::Terminus) {
            return Err(SkeletonError::InconsistentTopology {
                index: junction,
                detail: format!(
                    "branch in direction {} ends on pixel {} ({:?}), not on a terminus",
                    direction, branch.far_end, branch.far_kind
                ),
            });
        }
    }
    Ok(())
}

/// Branches at one junction that may be deleted.
///
/// Internal branches are always kept. Externals are ranked longest first and
/// the top ones are kept until the junction holds two protected branches.
pub fn deletion_candidates(branches: &[Branch]) -> Vec<&Branch> {
    let internal = branches.iter().filter(|b| b.internal).count();
    let keep_external = MIN_JUNCTION_BRANCHES.saturating_sub(internal);

    let mut external: Vec<&Branch> = branches.iter().filter(|b| !b.internal).collect();
    external.sort_by(|a, b| rank(a, b));
    external.into_iter().skip(keep_external).collect()
}

/// Pick the globally shortest deletable branch, if any.
pub fn select_branch<'a>(groups: &'a BTreeMap<usize, Vec<Branch>>) -> Result<Option<&'a Branch>> {
    let mut shortest: Option<&Branch> = None;
    for (&junction, branches) in groups {
        check_junction(junction, branches)?;
        for candidate in deletion_candidates(branches) {
            shortest = match shortest {
                Some(current) if shortest_first(current, candidate) != Ordering::Greater => Some(current),
                _ => Some(candidate),
            };
        }
    }
    Ok(shortest)
}

/// Set every pixel of a branch except its junction to background; returns the count
fn erase_branch(skeleton: &mut BinaryRaster, branch: &Branch) -> usize {
    let mut removed = 0;
    for (x, y) in branch.chain_code.points().into_iter().skip(1) {
        if skeleton.is_foreground_at(x, y) {
            skeleton.set_at(x, y, false);
            removed += 1;
        }
    }
    removed
}

/// Remove short side branches until no junction has a deletable branch left.
///
/// Each iteration re-derives labels and lines from scratch and deletes only
/// the single shortest candidate, so every decision sees current topology.
/// A deleted branch loses every pixel of its path except the junction it
/// hangs from; that pixel stays on the skeleton and is relabelled.
pub fn prune(skeleton: &BinaryRaster, max_iterations: usize) -> Result<PruneOutcome> {
    let mut skeleton = skeleton.clone();
    let mut iterations = 0;
    let mut removed_branches = 0;
    let mut removed_pixels = 0;

    loop {
        let labels = classify(&skeleton);
        let lines = extract_lines(&labels);
        let groups = collect_branches(&labels, &lines);

        let selected = select_branch(&groups)?.cloned();
        let Some(branch) = selected else {
            debug!(
                "Pruning converged after {} iterations: {} branches / {} pixels removed",
                iterations, removed_branches, removed_pixels
            );
            return Ok(PruneOutcome {
                skeleton,
                labels,
                lines,
                iterations,
                removed_branches,
                removed_pixels,
                converged: true,
            });
        };

        if iterations >= max_iterations {
            warn!(
                "Pruning stopped after {} iterations without converging ({} junctions still over-connected)",
                iterations,
                groups.len()
            );
            return Ok(PruneOutcome {
                skeleton,
                labels,
                lines,
                iterations,
                removed_branches,
                removed_pixels,
                converged: false,
            });
        }

        let pixels = erase_branch(&mut skeleton, &branch);
        debug!(
            "Iteration {}: removed branch at junction {} (length {:.3}, {} pixels)",
            iterations + 1,
            branch.junction,
            branch.length,
            pixels
        );

        iterations += 1;
        removed_branches += 1;
        removed_pixels += pixels;
    }
}

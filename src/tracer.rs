// src/tracer.rs - Directional line tracing between skeleton nodes

use crate::chain_code::ChainCode;
use crate::labels::{LabelRaster, EDGE, JUNCTION, NODE, PROCESSED, SKELETON, TERMINUS};
use crate::neighbourhood::{is_diagonal, opposite, step_length, Neighbourhood, DIRECTIONS};

/// Minimum number of steps before a walk may close back onto its start pixel
const MIN_LOOP_STEPS: usize = 4;

/// A traced skeleton line between two node pixels.
///
/// `start` and `end` are flattened pixel indices. A closed loop has
/// `start == end`; the chain code is oriented from `start` to `end` as walked.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: usize,
    pub end: usize,
    /// Axis steps count 1, diagonal steps sqrt(2)
    pub length: f64,
    pub chain_code: ChainCode,
}

impl Line {
    pub fn is_closed(&self) -> bool {
        self.start == self.end
    }

    pub fn start_point(&self) -> (u32, u32) {
        self.chain_code.origin()
    }

    pub fn end_point(&self) -> (u32, u32) {
        self.chain_code.end_point()
    }
}

/// Trace every line of a labelled skeleton.
///
/// Lines are returned longest first, ties ordered by start then end index.
pub fn extract_lines(labels: &LabelRaster) -> Vec<Line> {
    let mut tracer = LineTracer::new(labels);
    let mut lines = tracer.trace_all();
    sort_lines(&mut lines);
    lines
}

/// Deterministic presentation order: length descending, then start, then end index
pub fn sort_lines(lines: &mut [Line]) {
    lines.sort_by(|a, b| {
        b.length
            .total_cmp(&a.length)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });
}

/// Per-call tracing state. The label buffer is a private copy so the
/// PROCESSED overlay never leaks into the caller's raster.
struct LineTracer {
    geometry: Neighbourhood,
    work: Vec<u8>,
}

impl LineTracer {
    fn new(labels: &LabelRaster) -> Self {
        Self {
            geometry: Neighbourhood::new(labels.width(), labels.height()),
            work: labels.as_slice().iter().map(|&l| l & !PROCESSED).collect(),
        }
    }

    #[inline]
    fn unprocessed(&self, index: usize, flag: u8) -> bool {
        self.work[index] & (flag | PROCESSED) == flag
    }

    fn trace_all(&mut self) -> Vec<Line> {
        let mut lines = Vec::new();
        let size = self.work.len();

        // Line ends first, so branches are walked from the terminus inwards
        for index in 0..size {
            if self.unprocessed(index, TERMINUS) {
                self.work[index] |= PROCESSED;
                let mut used = 0u8;
                lines.extend(self.extend(index, &mut used));
            }
        }

        // One line per remaining branch leaving each junction
        for index in 0..size {
            if self.unprocessed(index, JUNCTION) {
                let mut used = 0u8;
                while let Some(line) = self.extend(index, &mut used) {
                    lines.push(line);
                }
                self.work[index] |= PROCESSED;
            }
        }

        // Whatever is left are loops without any node
        for index in 0..size {
            if self.unprocessed(index, EDGE) {
                self.work[index] |= PROCESSED;
                let mut used = 0u8;
                lines.extend(self.extend(index, &mut used));
            }
        }

        lines
    }

    /// Can a new line leave `start` in `direction`?
    fn is_start_target(&self, start: usize, direction: u8, used: u8) -> bool {
        if used & (1 << direction) != 0 {
            return false;
        }
        self.geometry
            .neighbour(start, direction)
            .map_or(false, |n| self.work[n] & SKELETON != 0 && self.work[n] & PROCESSED == 0)
    }

    /// First direction where the neighbourhood switches from "no target" to
    /// "target". Within that run an axis-aligned step wins over a diagonal one.
    fn start_direction(&self, start: usize, used: u8) -> Option<u8> {
        let mut valid = [false; 8];
        for d in 0..DIRECTIONS {
            valid[d as usize] = self.is_start_target(start, d, used);
        }

        let run_start = if valid.iter().all(|&v| v) {
            0
        } else {
            (0..DIRECTIONS).find(|&d| valid[d as usize] && !valid[((d + 7) % DIRECTIONS) as usize])?
        };

        let next = (run_start + 1) % DIRECTIONS;
        if is_diagonal(run_start) && valid[next as usize] {
            Some(next)
        } else {
            Some(run_start)
        }
    }

    /// Are the two pixels 8-neighbours?
    fn touches(&self, a: usize, b: usize) -> bool {
        self.geometry.direction_between(a, b).is_some()
    }

    /// Choose the step out of `current`, sweeping from just past the pixel we came from.
    ///
    /// Nodes (and the start pixel, when a loop may close) end the line and take
    /// precedence. A node reached diagonally is entered through the unprocessed
    /// edge pixel at the corner, if there is one, so the corner is not cut off.
    /// A node the previous pixel also touches only ends the line when nothing
    /// else continues it. Otherwise an unprocessed edge pixel continues the
    /// line: axis steps before diagonal ones, then pixels away from the start.
    fn next_direction(&self, current: usize, incoming: u8, start: usize, may_close: bool) -> Option<u8> {
        let back = opposite(incoming);
        let previous = self.geometry.neighbour(current, back);
        let sweep = (1..DIRECTIONS).map(move |i| (back + i) % DIRECTIONS);

        let ends_line = |n: usize| {
            if n == start {
                may_close
            } else {
                self.work[n] & NODE != 0
            }
        };
        let continues = |d: u8| {
            self.geometry
                .neighbour(current, d)
                .map_or(false, |n| n != start && self.unprocessed(n, EDGE))
        };

        let mut fallback = None;
        for d in sweep.clone() {
            let Some(n) = self.geometry.neighbour(current, d) else {
                continue;
            };
            if !ends_line(n) {
                continue;
            }
            if n != start && previous.map_or(false, |p| self.touches(p, n)) {
                fallback = fallback.or(Some(d));
                continue;
            }
            if is_diagonal(d) {
                let corner = [(d + DIRECTIONS - 1) % DIRECTIONS, (d + 1) % DIRECTIONS]
                    .into_iter()
                    .find(|&a| continues(a));
                if corner.is_some() {
                    return corner;
                }
            }
            return Some(d);
        }

        let mut candidates: Vec<u8> = sweep.filter(|&d| continues(d)).collect();
        candidates.sort_by_key(|&d| {
            let near_start = self
                .geometry
                .neighbour(current, d)
                .map_or(false, |n| self.touches(n, start));
            (is_diagonal(d), near_start)
        });
        candidates.first().copied().or(fallback)
    }

    /// Trace one line leaving `start`, recording the direction taken in `used`.
    ///
    /// Returns `None` when no unused, unprocessed neighbour is left.
    fn extend(&mut self, start: usize, used: &mut u8) -> Option<Line> {
        let first = self.start_direction(start, *used)?;
        *used |= 1 << first;

        // A line leaving a terminus can never come back to it
        let loop_allowed = self.work[start] & TERMINUS == 0;

        let (x, y) = self.geometry.coordinates(start);
        let mut chain_code = ChainCode::new(x, y);
        let mut length = 0.0;
        let mut current = start;
        let mut direction = first;

        loop {
            let Some(next) = self.geometry.neighbour(current, direction) else {
                break;
            };
            chain_code.push(direction);
            length += step_length(direction);
            current = next;

            if current == start {
                break;
            }

            let label = self.work[current];
            if label & NODE != 0 {
                if label & TERMINUS != 0 {
                    self.work[current] |= PROCESSED;
                }
                break;
            }

            self.work[current] |= PROCESSED;

            let may_close = loop_allowed && chain_code.len() + 1 >= MIN_LOOP_STEPS;
            match self.next_direction(current, direction, start, may_close) {
                Some(d) => direction = d,
                // Dangling end on a malformed skeleton
                None => break,
            }
        }

        if chain_code.is_empty() {
            return None;
        }

        Some(Line {
            start,
            end: current,
            length,
            chain_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::raster::BinaryRaster;
    use assert_approx_eq::assert_approx_eq;

    fn lines_of(rows: &[&str]) -> (LabelRaster, Vec<Line>) {
        let skeleton = BinaryRaster::from_ascii(rows).expect("valid fixture");
        let labels = classify(&skeleton);
        let lines = extract_lines(&labels);
        (labels, lines)
    }

    #[test]
    fn blank_raster_has_no_lines() {
        let (_, lines) = lines_of(&["....", "....", "...."]);
        assert!(lines.is_empty());
    }

    #[test]
    fn isolated_pixel_has_no_lines() {
        let (labels, lines) = lines_of(&["...", ".#.", "..."]);
        assert_eq!(labels.label_at(1, 1), TERMINUS);
        assert!(lines.is_empty());
    }

    #[test]
    fn straight_line_is_one_line() {
        let (_, lines) = lines_of(&[".......", ".#####.", "......."]);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_approx_eq!(line.length, 4.0);
        assert_eq!(line.start_point(), (1, 1));
        assert_eq!(line.end_point(), (5, 1));
        assert_eq!(line.chain_code.steps(), &[0, 0, 0, 0]);
    }

    #[test]
    fn diagonal_steps_weigh_sqrt_two() {
        let (_, lines) = lines_of(&["#....", ".#...", "..#..", "...##"]);
        assert_eq!(lines.len(), 1);
        assert_approx_eq!(lines[0].length, 1.0 + 3.0 * std::f64::consts::SQRT_2);
        assert_eq!(lines[0].start_point(), (0, 0));
        assert_eq!(lines[0].end_point(), (4, 3));
    }

    #[test]
    fn square_ring_is_single_closed_line() {
        let (labels, lines) = lines_of(&[
            "......",
            ".####.",
            ".#..#.",
            ".#..#.",
            ".####.",
            "......",
        ]);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert!(line.is_closed());
        assert_approx_eq!(line.length, 12.0);
        assert_eq!(line.chain_code.len(), 12);
        assert_eq!(line.end_point(), line.start_point());
        // The tracer works on its own copy of the labels
        assert!(labels.as_slice().iter().all(|&l| l & PROCESSED == 0));
    }

    #[test]
    fn diamond_ring_closes_after_four_diagonal_steps() {
        let (_, lines) = lines_of(&[".#.", "#.#", ".#."]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_closed());
        assert_approx_eq!(lines[0].length, 4.0 * std::f64::consts::SQRT_2);
    }

    #[test]
    fn t_junction_branches_end_at_junction() {
        let (labels, lines) = lines_of(&[
            ".............",
            ".............",
            ".###########.",
            "....#........",
            "....#........",
            ".............",
        ]);
        let junction = 2 * 13 + 4;
        assert_eq!(labels.label(junction), JUNCTION);

        assert_eq!(lines.len(), 3);
        let lengths: Vec<f64> = lines.iter().map(|l| l.length).collect();
        assert_eq!(lengths, vec![7.0, 3.0, 2.0]);
        for line in &lines {
            assert_eq!(line.end, junction);
            assert_eq!(labels.label(line.start), TERMINUS);
        }
    }

    #[test]
    fn junction_to_junction_line_is_traced_once() {
        let (labels, lines) = lines_of(&[
            ".........",
            ".#.....#.",
            ".#.....#.",
            ".#######.",
            ".#.....#.",
            ".#.....#.",
            ".........",
        ]);
        let left = 3 * 9 + 1;
        let right = 3 * 9 + 7;
        assert_eq!(labels.label(left), JUNCTION);
        assert_eq!(labels.label(right), JUNCTION);

        assert_eq!(lines.len(), 5);
        let bridge = &lines[0];
        assert_eq!((bridge.start, bridge.end), (left, right));
        assert_approx_eq!(bridge.length, 6.0);
        assert!(lines[1..].iter().all(|l| (l.length - 2.0).abs() < 1e-9));
    }

    #[test]
    fn every_line_ends_on_node_or_closes() {
        let (labels, lines) = lines_of(&[
            "..........",
            ".#......#.",
            "..#....#..",
            "...####...",
            "...#..#...",
            "..#....#..",
            "..........",
        ]);
        assert!(!lines.is_empty());
        for line in &lines {
            if !line.is_closed() {
                assert_ne!(labels.label(line.start) & NODE, 0);
                assert_ne!(labels.label(line.end) & NODE, 0);
            }
            let (ex, ey) = line.end_point();
            assert_eq!(ey as usize * 10 + ex as usize, line.end);
        }
    }

    #[test]
    fn corner_next_to_junction_is_walked_not_cut() {
        let rows = [
            "....###.....",
            "..###.#.....",
            ".##.##......",
            "##..........",
        ];
        let (labels, lines) = lines_of(&rows);
        let junction = 12 + 4;
        assert_eq!(labels.label(junction), JUNCTION);

        assert_eq!(lines.len(), 2);
        let ring = &lines[0];
        assert!(ring.is_closed());
        assert_eq!(ring.start, junction);
        assert_eq!(ring.chain_code.steps(), &[2, 0, 7, 6, 4, 4, 2]);
        assert_approx_eq!(ring.length, 6.0 + std::f64::consts::SQRT_2);

        let tail = &lines[1];
        assert_eq!((tail.start, tail.end), (3 * 12, junction));
        assert_eq!(tail.chain_code.steps(), &[0, 6, 0, 6, 0, 0]);

        // Every skeleton pixel lies on exactly the lines above
        let skeleton = BinaryRaster::from_ascii(&rows).expect("valid fixture");
        let mut covered = vec![false; skeleton.len()];
        for line in &lines {
            for (x, y) in line.chain_code.points() {
                covered[y as usize * 12 + x as usize] = true;
            }
        }
        for index in 0..skeleton.len() {
            assert_eq!(covered[index], skeleton.is_foreground(index), "pixel {}", index);
        }
    }

    #[test]
    fn y_with_diagonal_arms() {
        let (labels, lines) = lines_of(&[
            "#.......#",
            ".#.....#.",
            "..#...#..",
            "...#.#...",
            "....#....",
            "....#....",
            "....#....",
            "....#....",
            ".........",
        ]);
        let junction = 4 * 9 + 4;
        assert_eq!(labels.label(junction), JUNCTION);

        assert_eq!(lines.len(), 3);
        let ends: Vec<(usize, usize)> = lines.iter().map(|l| (l.start, l.end)).collect();
        assert_eq!(ends, vec![(0, junction), (8, junction), (7 * 9 + 4, junction)]);
        assert_approx_eq!(lines[0].length, 4.0 * std::f64::consts::SQRT_2);
        assert_approx_eq!(lines[1].length, 4.0 * std::f64::consts::SQRT_2);
        assert_approx_eq!(lines[2].length, 3.0);
    }

    #[test]
    fn sorting_is_deterministic() {
        let mut lines = vec![
            Line { start: 5, end: 9, length: 2.0, chain_code: ChainCode::new(0, 0) },
            Line { start: 1, end: 9, length: 2.0, chain_code: ChainCode::new(0, 0) },
            Line { start: 7, end: 3, length: 4.5, chain_code: ChainCode::new(0, 0) },
        ];
        sort_lines(&mut lines);
        let order: Vec<usize> = lines.iter().map(|l| l.start).collect();
        assert_eq!(order, vec![7, 1, 5]);
    }
}

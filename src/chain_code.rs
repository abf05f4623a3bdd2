// src/chain_code.rs - Appendable 8-connected path encoding

use crate::neighbourhood::{opposite, step_length, DIRECTIONS, DX, DY};

/// A pixel path stored as an origin plus one direction code per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCode {
    origin: (u32, u32),
    steps: Vec<u8>,
}

impl ChainCode {
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            origin: (x, y),
            steps: Vec::new(),
        }
    }

    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    pub fn steps(&self) -> &[u8] {
        &self.steps
    }

    /// Append one step
    pub fn push(&mut self, direction: u8) {
        debug_assert!(direction < DIRECTIONS, "invalid direction code {}", direction);
        self.steps.push(direction);
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first_direction(&self) -> Option<u8> {
        self.steps.first().copied()
    }

    /// Path length with axis steps counting 1 and diagonal steps sqrt(2)
    pub fn length(&self) -> f64 {
        self.steps.iter().map(|&d| step_length(d)).sum()
    }

    /// Final position obtained by replaying every step from the origin
    pub fn end_point(&self) -> (u32, u32) {
        let (mut x, mut y) = (self.origin.0 as i64, self.origin.1 as i64);
        for &d in &self.steps {
            x += DX[d as usize] as i64;
            y += DY[d as usize] as i64;
        }
        (x as u32, y as u32)
    }

    /// The same path walked the other way: starts at the old end point,
    /// steps in reverse order, each flipped to its opposite direction.
    pub fn reversed(&self) -> ChainCode {
        let (x, y) = self.end_point();
        ChainCode {
            origin: (x, y),
            steps: self.steps.iter().rev().map(|&d| opposite(d)).collect(),
        }
    }

    /// Every pixel on the path, origin first
    pub fn points(&self) -> Vec<(u32, u32)> {
        let mut points = Vec::with_capacity(self.steps.len() + 1);
        let (mut x, mut y) = (self.origin.0 as i64, self.origin.1 as i64);
        points.push(self.origin);
        for &d in &self.steps {
            x += DX[d as usize] as i64;
            y += DY[d as usize] as i64;
            points.push((x as u32, y as u32));
        }
        points
    }
}

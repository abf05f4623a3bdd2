// src/neighbourhood.rs - 8-connected neighbourhood geometry shared by classifier, tracer and chain code

/// Number of 8-connected directions
pub const DIRECTIONS: u8 = 8;

/// Column offsets per direction code, clockwise starting east (y grows downward)
pub const DX: [i32; 8] = [
    1,  // 0: right
    1,  // 1: down-right
    0,  // 2: down
    -1, // 3: down-left
    -1, // 4: left
    -1, // 5: up-left
    0,  // 6: up
    1,  // 7: up-right
];

/// Row offsets per direction code
pub const DY: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];

/// Direction pointing back along `direction`
#[inline]
pub fn opposite(direction: u8) -> u8 {
    (direction + 4) % DIRECTIONS
}

/// Odd codes are the diagonal steps
#[inline]
pub fn is_diagonal(direction: u8) -> bool {
    direction % 2 == 1
}

/// Euclidean length of a single step in `direction`
#[inline]
pub fn step_length(direction: u8) -> f64 {
    if is_diagonal(direction) {
        std::f64::consts::SQRT_2
    } else {
        1.0
    }
}

/// Precomputed offsets and boundary tests for a `width` x `height` grid.
///
/// Pixels are addressed with a flattened index `y * width + x`. Neighbours
/// outside the grid do not exist (no wraparound) and count as background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbourhood {
    width: u32,
    height: u32,
    offsets: [isize; 8],
}

impl Neighbourhood {
    pub fn new(width: u32, height: u32) -> Self {
        let mut offsets = [0isize; 8];
        for d in 0..DIRECTIONS as usize {
            offsets[d] = DY[d] as isize * width as isize + DX[d] as isize;
        }

        Self { width, height, offsets }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Flattened index offset of the neighbour in `direction`
    #[inline]
    pub fn offset(&self, direction: u8) -> isize {
        self.offsets[direction as usize]
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn coordinates(&self, index: usize) -> (u32, u32) {
        let width = self.width as usize;
        ((index % width) as u32, (index / width) as u32)
    }

    /// True iff the pixel touches none of the four borders
    #[inline]
    pub fn is_inner(&self, x: u32, y: u32) -> bool {
        x > 0 && y > 0 && x + 1 < self.width && y + 1 < self.height
    }

    /// True iff the neighbour of (x, y) in `direction` lies on the grid
    #[inline]
    pub fn is_within_bounds(&self, x: u32, y: u32, direction: u8) -> bool {
        let nx = x as i64 + DX[direction as usize] as i64;
        let ny = y as i64 + DY[direction as usize] as i64;
        nx >= 0 && ny >= 0 && nx < self.width as i64 && ny < self.height as i64
    }

    /// Index of the neighbour in `direction`, or `None` when it falls off the grid
    #[inline]
    pub fn neighbour(&self, index: usize, direction: u8) -> Option<usize> {
        let (x, y) = self.coordinates(index);
        if self.is_inner(x, y) || self.is_within_bounds(x, y, direction) {
            Some((index as isize + self.offset(direction)) as usize)
        } else {
            None
        }
    }

    /// Direction code leading from `from` to the adjacent pixel `to`
    pub fn direction_between(&self, from: usize, to: usize) -> Option<u8> {
        (0..DIRECTIONS).find(|&d| self.neighbour(from, d) == Some(to))
    }
}

//! Cardinal adjacency masks.
//!
//! Each cell gets a 4-bit mask saying which of its cardinal neighbours hold
//! the same value. Cells outside the grid never match.

use crate::tilemap::Tilemap;

/// The four cardinal directions, with their locked mask bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Bit set in the mask when the neighbour in this direction matches.
    pub fn bit(self) -> u8 {
        match self {
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 4,
            Direction::West => 8,
        }
    }

    /// Grid offset (dx, dy); y grows southwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// All four bits set.
pub const FULL_MASK: u8 = 0x0F;

/// Mask for the cell at `(x, y)`.
pub fn adjacency_mask<T: PartialEq>(grid: &Tilemap<T>, x: usize, y: usize) -> u8 {
    let here = grid.get(x, y);
    Direction::ALL.iter().fold(0u8, |mask, &dir| {
        let (dx, dy) = dir.offset();
        match grid.offset(x, y, dx, dy) {
            Some(neighbor) if neighbor == here => mask | dir.bit(),
            _ => mask,
        }
    })
}

/// Compute the adjacency mask of every cell.
///
/// Every mask depends only on the read-only input grid, so cells are
/// computed in parallel without affecting the result.
pub fn compute_adjacency_masks<T: PartialEq + Sync>(grid: &Tilemap<T>) -> Tilemap<u8> {
    Tilemap::par_from_fn(grid.width, grid.height, |x, y| adjacency_mask(grid, x, y))
}

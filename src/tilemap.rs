use rayon::prelude::*;

/// A dense 2D grid stored row-major in a single flat buffer.
///
/// Cell `(x, y)` lives at `y * width + x`, which is also the order every
/// binary artifact uses on disk. Edges never wrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T: Send> Tilemap<T> {
    /// Build a map by evaluating `f(x, y)` for every cell on the rayon pool.
    ///
    /// Each cell is computed independently and collected in index order, so
    /// the result does not depend on scheduling.
    pub fn par_from_fn<F>(width: usize, height: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> T + Sync,
    {
        let data = (0..width * height)
            .into_par_iter()
            .map(|idx| f(idx % width, idx / width))
            .collect();
        Self { width, height, data }
    }
}

impl<T> Tilemap<T> {
    /// Wrap an existing row-major buffer.
    ///
    /// Returns `None` when the buffer length does not equal `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if width.checked_mul(height)? != data.len() {
            return None;
        }
        Some(Self { width, height, data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat offset of `(x, y)`.
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Look up the cell at `(x + dx, y + dy)`, or `None` if it falls outside the grid.
    pub fn offset(&self, x: usize, y: usize, dx: i32, dy: i32) -> Option<&T> {
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if self.contains(nx, ny) {
            Some(self.get(nx as usize, ny as usize))
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Build a new map of the same shape by applying `f` to every cell.
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Tilemap<U> {
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

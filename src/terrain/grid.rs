// Fixed-size row-major 2D storage shared by height and classification data.

/// Immutable width × height array. Dimensions are set once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// Normalized terrain heights.
pub type HeightGrid = Grid<f32>;

/// Region index per cell, into the region table the grid was classified with.
pub type ClassificationGrid = Grid<u8>;

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer. Panics if the buffer length does not
    /// match `width * height`.
    pub fn from_vec(width: usize, height: usize, cells: Vec<T>) -> Self {
        assert_eq!(
            cells.len(),
            width * height,
            "grid buffer length {} does not match {}x{}",
            cells.len(),
            width,
            height
        );
        Self { width, height, cells }
    }

    /// Build a grid by evaluating `f(x, y)` for every cell, row by row.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.cells[self.index(x, y)]
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Derive a same-sized grid cell by cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T: Copy> Grid<T> {
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> T {
        self.cells[self.index(x, y)]
    }
}

impl Grid<f32> {
    /// Smallest and largest cell value, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.cells.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

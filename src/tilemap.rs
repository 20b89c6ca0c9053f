/// A dense 2D grid indexed by `(row, col)`. Edges do not wrap.
///
/// Both the heightmap and the category grid use this type, so a cell `(i, j)`
/// always names the same terrain column in every stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub rows: usize,
    pub cols: usize,
    data: Vec<T>,
}

impl<T> Tilemap<T> {
    /// Assemble a grid from rows given in order. Every row must have `cols` entries.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let data = rows.into_iter().flatten().collect();
        Some(Self { rows: row_count, cols, data })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols, "({row}, {col}) out of bounds");
        row * self.cols + col
    }

    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[self.index(row, col)]
    }

    /// One full row as a slice.
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// True when both grids have the same dimensions.
    pub fn same_shape<U>(&self, other: &Tilemap<U>) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl Tilemap<f64> {
    /// Smallest and largest value in the grid, or `None` when empty.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut values = self.data.iter().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

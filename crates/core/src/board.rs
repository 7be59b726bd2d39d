//! Board module - manages the game grid
//!
//! The grid is an 8x8 matrix of binary cells stored as a flat array for cache
//! locality and zero allocation. Coordinates are `(row, col)` with row 0 at the
//! top and col 0 at the left.
//!
//! Two wrappers own a [`Grid`]:
//!
//! - [`Board`]: the live board of a session. [`Board::place`] is the only
//!   placement entry that writes to it.
//! - [`SimulatedBoard`]: a detached copy used for lookahead by the piece
//!   generator. It can never be turned back into a `Board`, so a simulation
//!   cannot leak into real state.

use arrayvec::ArrayVec;

use crate::shapes::Shape;
use crate::types::{Position, GRID_CELLS, GRID_SIZE};

/// Indices of full rows and columns found on a grid
///
/// Rows are listed top to bottom, columns left to right. A cell on both a full
/// row and a full column shows up in both lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LineClear {
    pub rows: ArrayVec<usize, GRID_SIZE>,
    pub cols: ArrayVec<usize, GRID_SIZE>,
}

impl LineClear {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }

    /// Full rows plus full columns, without deduplicating shared cells
    pub fn line_count(&self) -> u32 {
        (self.rows.len() + self.cols.len()) as u32
    }
}

/// Raw 8x8 occupancy matrix (0 = empty, 1 = filled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    /// Flat array of cells, row-major order (row * GRID_SIZE + col)
    cells: [u8; GRID_CELLS],
}

impl Grid {
    /// Create an empty grid
    pub fn empty() -> Self {
        Self {
            cells: [0; GRID_CELLS],
        }
    }

    /// Create from a row-major matrix; any non-zero value counts as filled
    pub fn from_rows(rows: [[u8; GRID_SIZE]; GRID_SIZE]) -> Self {
        let mut cells = [0u8; GRID_CELLS];
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                cells[r * GRID_SIZE + c] = u8::from(v != 0);
            }
        }
        Self { cells }
    }

    /// Convert to a row-major matrix
    pub fn to_rows(&self) -> [[u8; GRID_SIZE]; GRID_SIZE] {
        let mut rows = [[0u8; GRID_SIZE]; GRID_SIZE];
        for (r, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&self.cells[r * GRID_SIZE..(r + 1) * GRID_SIZE]);
        }
        rows
    }

    /// Calculate flat index from (row, col)
    #[inline(always)]
    fn index(row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 || row >= GRID_SIZE as i32 || col >= GRID_SIZE as i32 {
            return None;
        }
        Some(row as usize * GRID_SIZE + col as usize)
    }

    /// Get cell at (row, col); None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<u8> {
        Self::index(row, col).map(|idx| self.cells[idx])
    }

    /// Check if (row, col) is inside the grid and filled
    pub fn is_filled(&self, row: i32, col: i32) -> bool {
        matches!(self.get(row, col), Some(1))
    }

    /// Number of filled cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 1).count()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Check whether `shape` fits with its top-left corner at `pos`
    ///
    /// Fails when the shape sticks out of the grid on any side or when one of
    /// its filled cells lands on an already filled grid cell.
    pub fn can_place(&self, shape: &Shape, pos: Position) -> bool {
        if pos.row < 0 || pos.col < 0 {
            return false;
        }
        if pos.row as usize + shape.rows() > GRID_SIZE || pos.col as usize + shape.cols() > GRID_SIZE
        {
            return false;
        }
        shape
            .filled_cells()
            .all(|(dr, dc)| !self.is_filled(pos.row + dr as i32, pos.col + dc as i32))
    }

    /// Write every filled shape cell. Callers check [`Grid::can_place`] first.
    fn fill(&mut self, shape: &Shape, pos: Position) {
        for (dr, dc) in shape.filled_cells() {
            if let Some(idx) = Self::index(pos.row + dr as i32, pos.col + dc as i32) {
                self.cells[idx] = 1;
            }
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, row: usize) -> bool {
        if row >= GRID_SIZE {
            return false;
        }
        let start = row * GRID_SIZE;
        self.cells[start..start + GRID_SIZE].iter().all(|&v| v == 1)
    }

    /// Check if a column is completely filled
    pub fn is_col_full(&self, col: usize) -> bool {
        if col >= GRID_SIZE {
            return false;
        }
        (0..GRID_SIZE).all(|row| self.cells[row * GRID_SIZE + col] == 1)
    }

    /// Find every full row and every full column
    ///
    /// Rows and columns are checked independently against the same grid.
    pub fn detect_full_lines(&self) -> LineClear {
        let mut lines = LineClear::default();
        for row in 0..GRID_SIZE {
            if self.is_row_full(row) {
                lines.rows.push(row);
            }
        }
        for col in 0..GRID_SIZE {
            if self.is_col_full(col) {
                lines.cols.push(col);
            }
        }
        lines
    }

    /// Empty every listed row, then every listed column
    ///
    /// Cells on both a listed row and a listed column are cleared once;
    /// out-of-range indices are ignored.
    fn clear_lines(&mut self, lines: &LineClear) {
        for &row in lines.rows.iter().filter(|&&r| r < GRID_SIZE) {
            let start = row * GRID_SIZE;
            for cell in &mut self.cells[start..start + GRID_SIZE] {
                *cell = 0;
            }
        }
        for &col in lines.cols.iter().filter(|&&c| c < GRID_SIZE) {
            for row in 0..GRID_SIZE {
                self.cells[row * GRID_SIZE + col] = 0;
            }
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

/// The live board of one game session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    grid: Grid,
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self { grid: Grid::empty() }
    }

    /// Start from an existing grid
    pub fn from_grid(grid: Grid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn can_place(&self, shape: &Shape, pos: Position) -> bool {
        self.grid.can_place(shape, pos)
    }

    /// Place `shape` at `pos`
    ///
    /// Returns false and leaves the board untouched if the shape is out of
    /// bounds or overlaps a filled cell.
    pub fn place(&mut self, shape: &Shape, pos: Position) -> bool {
        if !self.grid.can_place(shape, pos) {
            return false;
        }
        self.grid.fill(shape, pos);
        true
    }

    pub fn detect_full_lines(&self) -> LineClear {
        self.grid.detect_full_lines()
    }

    pub fn clear_lines(&mut self, lines: &LineClear) {
        self.grid.clear_lines(lines);
    }

    /// Copy this board into a detached simulation
    pub fn detach(&self) -> SimulatedBoard {
        SimulatedBoard { grid: self.grid }
    }
}

/// A detached copy of a board for lookahead
///
/// Mutations only ever touch this copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedBoard {
    grid: Grid,
}

impl SimulatedBoard {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Place, detect and clear in one step
    ///
    /// Same semantics as `Board::place` followed by `detect_full_lines` and
    /// `clear_lines`. Returns None (no mutation) if the shape does not fit.
    pub fn place_and_clear(&mut self, shape: &Shape, pos: Position) -> Option<LineClear> {
        if !self.grid.can_place(shape, pos) {
            return None;
        }
        self.grid.fill(shape, pos);
        let lines = self.grid.detect_full_lines();
        self.grid.clear_lines(&lines);
        Some(lines)
    }
}

/// First position (row-major) where `shape` fits on `grid`
///
/// Existence query only; the grid is never modified.
pub fn find_first_valid_position(grid: &Grid, shape: &Shape) -> Option<Position> {
    let max_row = GRID_SIZE.checked_sub(shape.rows())?;
    let max_col = GRID_SIZE.checked_sub(shape.cols())?;
    for row in 0..=max_row {
        for col in 0..=max_col {
            let pos = Position::new(row as i32, col as i32);
            if grid.can_place(shape, pos) {
                return Some(pos);
            }
        }
    }
    None
}

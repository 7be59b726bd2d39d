//! Shapes module - piece catalog and the 90° rotation transform
//!
//! A [`Shape`] is a rectangular binary matrix with at least one filled cell.
//! It has no position of its own; the board decides where it lands.
//! Shapes are compared structurally (dimensions plus cell contents), which
//! is also how a placement request is matched against the held pieces.

use arrayvec::ArrayVec;

use crate::types::{MAX_SHAPE_CELLS, MAX_SHAPE_SIDE};

/// Reasons a matrix cannot be turned into a [`Shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("shape has no rows or no columns")]
    Empty,
    #[error("shape rows have different lengths")]
    Ragged,
    #[error("shape cells must be 0 or 1")]
    NotBinary,
    #[error("shape has no filled cell")]
    NoFilledCell,
    #[error("shape exceeds 4x4")]
    TooLarge,
}

/// A rectangular binary piece template
///
/// Cells are stored row-major with exactly `rows * cols` entries, so derived
/// equality is exact cell-by-cell equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: u8,
    cols: u8,
    cells: ArrayVec<u8, MAX_SHAPE_CELLS>,
}

impl Shape {
    /// Build a shape from a row-major matrix, validating it
    ///
    /// # Examples
    ///
    /// ```
    /// use block_puzzle_core::Shape;
    ///
    /// let t = Shape::from_rows(&[[0u8, 1, 0], [1, 1, 1]]).unwrap();
    /// assert_eq!((t.rows(), t.cols()), (2, 3));
    /// assert_eq!(t.block_count(), 4);
    ///
    /// assert!(Shape::from_rows(&[[0u8, 0]]).is_err());
    /// ```
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, ShapeError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(ShapeError::Empty);
        }
        if rows.iter().any(|r| r.as_ref().len() != width) {
            return Err(ShapeError::Ragged);
        }
        if rows.iter().flat_map(|r| r.as_ref()).any(|&v| v > 1) {
            return Err(ShapeError::NotBinary);
        }
        if height > MAX_SHAPE_SIDE || width > MAX_SHAPE_SIDE {
            return Err(ShapeError::TooLarge);
        }

        let mut cells = ArrayVec::new();
        for row in rows {
            cells.extend(row.as_ref().iter().copied());
        }
        if cells.iter().all(|&v| v == 0) {
            return Err(ShapeError::NoFilledCell);
        }

        Ok(Self {
            rows: height as u8,
            cols: width as u8,
            cells,
        })
    }

    /// Catalog matrices are known to be valid.
    fn from_catalog(rows: &[&[u8]]) -> Self {
        let mut cells = ArrayVec::new();
        for row in rows {
            cells.extend(row.iter().copied());
        }
        Self {
            rows: rows.len() as u8,
            cols: rows[0].len() as u8,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    /// Whether the cell at (row, col) is filled; out of range reads as empty
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols() && self.cells[row * self.cols() + col] == 1
    }

    /// Number of filled cells
    pub fn block_count(&self) -> u32 {
        self.cells.iter().filter(|&&v| v == 1).count() as u32
    }

    /// Offsets (row, col) of every filled cell, row-major
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols();
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 1)
            .map(move |(i, _)| (i / cols, i % cols))
    }

    /// Rotate 90° clockwise: an R x C matrix becomes C x R with
    /// `out[c][R - 1 - r] = in[r][c]`
    pub fn rotate_cw(&self) -> Self {
        let (r_count, c_count) = (self.rows(), self.cols());
        let mut cells: ArrayVec<u8, MAX_SHAPE_CELLS> = ArrayVec::new();
        // Output is c_count rows of r_count columns.
        for out_row in 0..c_count {
            for out_col in 0..r_count {
                let in_row = r_count - 1 - out_col;
                let in_col = out_row;
                cells.push(self.cells[in_row * c_count + in_col]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }

    /// Row-major copy of the matrix
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols())
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}

/// Every structurally distinct rotation of `shape`, in the order produced
///
/// The input comes first, followed by successive clockwise rotations that
/// differ from all earlier ones. Squares and the single cell yield 1 entry,
/// straight bars 2, everything else in the catalog 4.
pub fn all_rotations(shape: &Shape) -> ArrayVec<Shape, 4> {
    let mut distinct: ArrayVec<Shape, 4> = ArrayVec::new();
    let mut current = shape.clone();
    for _ in 0..4 {
        if !distinct.contains(&current) {
            distinct.push(current.clone());
        }
        current = current.rotate_cw();
    }
    distinct
}

/// The 11 canonical catalog shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    I4,
    I3,
    I2,
    I1,
    LLarge,
    LSmall,
    LTall,
    T,
    Z,
    Square3,
    Square2,
}

/// Catalog order; uniform draws index into this array
pub const CATALOG: [ShapeKind; 11] = [
    ShapeKind::I4,
    ShapeKind::I3,
    ShapeKind::I2,
    ShapeKind::I1,
    ShapeKind::LLarge,
    ShapeKind::LSmall,
    ShapeKind::LTall,
    ShapeKind::T,
    ShapeKind::Z,
    ShapeKind::Square3,
    ShapeKind::Square2,
];

impl ShapeKind {
    /// Canonical (unrotated) matrix for this kind
    pub fn shape(&self) -> Shape {
        match self {
            ShapeKind::I4 => Shape::from_catalog(&[&[1, 1, 1, 1]]),
            ShapeKind::I3 => Shape::from_catalog(&[&[1, 1, 1]]),
            ShapeKind::I2 => Shape::from_catalog(&[&[1, 1]]),
            ShapeKind::I1 => Shape::from_catalog(&[&[1]]),
            ShapeKind::LLarge => Shape::from_catalog(&[&[1, 0, 0], &[1, 0, 0], &[1, 1, 1]]),
            ShapeKind::LSmall => Shape::from_catalog(&[&[1, 0], &[1, 1]]),
            ShapeKind::LTall => Shape::from_catalog(&[&[1, 0], &[1, 0], &[1, 1]]),
            ShapeKind::T => Shape::from_catalog(&[&[0, 1, 0], &[1, 1, 1]]),
            ShapeKind::Z => Shape::from_catalog(&[&[1, 1, 0], &[0, 1, 1]]),
            ShapeKind::Square3 => Shape::from_catalog(&[&[1, 1, 1], &[1, 1, 1], &[1, 1, 1]]),
            ShapeKind::Square2 => Shape::from_catalog(&[&[1, 1], &[1, 1]]),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::I4 => "i4",
            ShapeKind::I3 => "i3",
            ShapeKind::I2 => "i2",
            ShapeKind::I1 => "i1",
            ShapeKind::LLarge => "l-large",
            ShapeKind::LSmall => "l-small",
            ShapeKind::LTall => "l-tall",
            ShapeKind::T => "t",
            ShapeKind::Z => "z",
            ShapeKind::Square3 => "square3",
            ShapeKind::Square2 => "square2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_cw_maps_cells() {
        // [1,0]/[1,1] -> [1,1]/[1,0]
        let l = ShapeKind::LSmall.shape();
        let rotated = l.rotate_cw();
        assert_eq!(rotated.to_rows(), vec![vec![1, 1], vec![1, 0]]);

        let bar = ShapeKind::I3.shape().rotate_cw();
        assert_eq!((bar.rows(), bar.cols()), (3, 1));
    }

    #[test]
    fn test_from_rows_rejects_malformed() {
        let empty: [[u8; 0]; 0] = [];
        assert_eq!(Shape::from_rows(&empty), Err(ShapeError::Empty));
        assert_eq!(
            Shape::from_rows(&[vec![1u8, 1], vec![1]]),
            Err(ShapeError::Ragged)
        );
        assert_eq!(Shape::from_rows(&[[2u8]]), Err(ShapeError::NotBinary));
        assert_eq!(Shape::from_rows(&[[0u8, 0]]), Err(ShapeError::NoFilledCell));
        assert_eq!(Shape::from_rows(&[[1u8; 5]]), Err(ShapeError::TooLarge));
    }

    #[test]
    fn test_catalog_shapes_parse_identically() {
        for kind in CATALOG {
            let shape = kind.shape();
            assert_eq!(Shape::from_rows(&shape.to_rows()[..]), Ok(shape));
        }
    }

    #[test]
    fn test_filled_cells_row_major() {
        let t = ShapeKind::T.shape();
        let cells: Vec<_> = t.filled_cells().collect();
        assert_eq!(cells, vec![(0, 1), (1, 0), (1, 1), (1, 2)]);
    }
}

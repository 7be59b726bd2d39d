//! Core types module - shared constants and plain data
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core rules, session service, wire protocol).
//!
//! # Grid
//!
//! The board is a square grid of binary cells:
//!
//! - **Size**: 8 x 8 (indexed 0-7 on both axes)
//! - **Coordinates**: `(row, col)`, row 0 at the top, col 0 at the left
//! - **Cell values**: 0 = empty, 1 = filled
//!
//! # Rounds
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SLOT_COUNT` | 3 | Pieces dealt per round |
//! | `MAX_GENERATION_ATTEMPTS` | 50 | Random shape draws per piece before falling back |
//! | `LINE_BASE_POINTS` | 10 | Points per cleared line |
//! | `LINE_COMBO_POINTS` | 2 | Multiplier of the `lines * (lines - 1)` combo term |
//!
//! # Examples
//!
//! ```
//! use block_puzzle_types::{Lifecycle, PieceColor, Position, GRID_SIZE, SLOT_COUNT};
//!
//! assert_eq!(GRID_SIZE, 8);
//! assert_eq!(SLOT_COUNT, 3);
//!
//! let pos = Position::new(5, 7);
//! assert_eq!((pos.row, pos.col), (5, 7));
//!
//! assert_eq!(PieceColor::from_str("teal"), Some(PieceColor::Teal));
//! assert!(Lifecycle::Active.is_active());
//! ```

/// Board width and height in cells (8 x 8)
pub const GRID_SIZE: usize = 8;

/// Total number of cells on the board
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// Number of piece slots dealt per round
pub const SLOT_COUNT: usize = 3;

/// Random shape draws per generated piece before falling back to an unchecked shape
pub const MAX_GENERATION_ATTEMPTS: u32 = 50;

/// Largest row or column count of any catalog shape (the I4 bar)
pub const MAX_SHAPE_SIDE: usize = 4;

/// Upper bound on the cell count of a shape matrix
pub const MAX_SHAPE_CELLS: usize = MAX_SHAPE_SIDE * MAX_SHAPE_SIDE;

/// Points awarded per cleared line
pub const LINE_BASE_POINTS: u32 = 10;

/// Multiplier of the combo term `lines * (lines - 1)`
pub const LINE_COMBO_POINTS: u32 = 2;

/// Name stored on a leaderboard record when the player leaves it blank
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

/// Longest player name kept on a leaderboard record (in chars)
pub const MAX_PLAYER_NAME_CHARS: usize = 32;

/// A cell coordinate on the grid
///
/// Rows grow downward, columns grow to the right. Values outside
/// `0..GRID_SIZE` are representable so callers can ask about them;
/// placement checks reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// Cosmetic color tag of a dealt piece
///
/// Colors carry no gameplay meaning; the palette has 8 entries and one is
/// chosen uniformly at random for every generated piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
}

impl PieceColor {
    /// The full palette, in a fixed order
    pub const ALL: [PieceColor; 8] = [
        PieceColor::Red,
        PieceColor::Orange,
        PieceColor::Yellow,
        PieceColor::Green,
        PieceColor::Teal,
        PieceColor::Blue,
        PieceColor::Purple,
        PieceColor::Pink,
    ];

    /// Parse a color tag (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use block_puzzle_types::PieceColor;
    ///
    /// assert_eq!(PieceColor::from_str("Red"), Some(PieceColor::Red));
    /// assert_eq!(PieceColor::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(PieceColor::Red),
            "orange" => Some(PieceColor::Orange),
            "yellow" => Some(PieceColor::Yellow),
            "green" => Some(PieceColor::Green),
            "teal" => Some(PieceColor::Teal),
            "blue" => Some(PieceColor::Blue),
            "purple" => Some(PieceColor::Purple),
            "pink" => Some(PieceColor::Pink),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceColor::Red => "red",
            PieceColor::Orange => "orange",
            PieceColor::Yellow => "yellow",
            PieceColor::Green => "green",
            PieceColor::Teal => "teal",
            PieceColor::Blue => "blue",
            PieceColor::Purple => "purple",
            PieceColor::Pink => "pink",
        }
    }
}

/// Lifecycle of a game session
///
/// - **Active**: accepts placements and replenishments
/// - **Over**: terminal; the board and score are frozen
///
/// The only transition is `Active -> Over`, taken when every held piece is
/// unplaceable on the current board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    #[default]
    Active,
    Over,
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn is_over(&self) -> bool {
        matches!(self, Lifecycle::Over)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_and_scoring_defaults() {
        assert_eq!(GRID_SIZE, 8);
        assert_eq!(GRID_CELLS, 64);
        assert_eq!(SLOT_COUNT, 3);
        assert_eq!(MAX_GENERATION_ATTEMPTS, 50);
        assert_eq!(LINE_BASE_POINTS, 10);
        assert_eq!(LINE_COMBO_POINTS, 2);
    }

    #[test]
    fn palette_round_trips_through_str() {
        for color in PieceColor::ALL {
            assert_eq!(PieceColor::from_str(color.as_str()), Some(color));
        }
        assert_eq!(PieceColor::from_str("chartreuse"), None);
    }
}

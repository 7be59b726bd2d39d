//! Generator module - deals the pieces of a round
//!
//! Pieces are drawn uniformly from the catalog, but each draw is checked
//! against a detached copy of the board: the first rotation that fits
//! somewhere is kept, and that placement (including any line clears it
//! completes) is applied to the copy before the next piece is drawn. Later
//! pieces of a round are therefore dealt against a plausibly-cleared board
//! instead of an ever-filling one.
//!
//! This is a greedy approximation: it commits to the first fit it finds and
//! never searches for the best one, so a dealt round is likely, not certain,
//! to be placeable.
//!
//! All randomness comes from the caller's [`rand::Rng`], so a seeded RNG
//! reproduces a round exactly.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{find_first_valid_position, Board, SimulatedBoard};
use crate::shapes::{all_rotations, Shape, CATALOG};
use crate::types::{PieceColor, Position, MAX_GENERATION_ATTEMPTS};

/// Opaque identifier of a dealt piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(pub u64);

/// A dealt piece: a (possibly rotated) shape plus cosmetic tags
///
/// Only the shape matters for placement; `id` and `color` are never compared
/// when matching a placement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceInstance {
    pub id: PieceId,
    pub color: PieceColor,
    pub shape: Shape,
}

impl PieceInstance {
    /// Wrap a shape with a random color and a fresh id
    pub fn new<R: Rng + ?Sized>(shape: Shape, rng: &mut R) -> Self {
        let color = PieceColor::ALL[rng.random_range(0..PieceColor::ALL.len())];
        Self {
            id: PieceId(rng.random()),
            color,
            shape,
        }
    }

    /// Structural match against a requested shape
    pub fn matches(&self, shape: &Shape) -> bool {
        self.shape == *shape
    }
}

/// Counters from one generated round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationStats {
    /// Catalog draws over all pieces of the round.
    pub attempts: u32,
    /// Pieces dealt without a fitting position.
    pub fallbacks: u32,
}

/// Feasibility-biased piece dealer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceGenerator {
    max_attempts: u32,
}

impl PieceGenerator {
    pub fn new() -> Self {
        Self {
            max_attempts: MAX_GENERATION_ATTEMPTS,
        }
    }

    /// Deal `count` pieces for `board`
    ///
    /// Always returns exactly `count` pieces. The board itself is never
    /// modified.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        board: &Board,
        rng: &mut R,
    ) -> Vec<PieceInstance> {
        self.generate_with_stats(count, board, rng).0
    }

    /// Same as [`PieceGenerator::generate`], also reporting draw counters
    pub fn generate_with_stats<R: Rng + ?Sized>(
        &self,
        count: usize,
        board: &Board,
        rng: &mut R,
    ) -> (Vec<PieceInstance>, GenerationStats) {
        let mut working = board.detach();
        let mut stats = GenerationStats::default();
        let mut pieces = Vec::with_capacity(count);

        for _ in 0..count {
            let (found, attempts) = self.find_fit(&working, rng);
            stats.attempts += attempts;

            let piece = match found {
                Some((variant, pos)) => {
                    // Model the player placing this piece before the next one arrives.
                    working.place_and_clear(&variant, pos);
                    PieceInstance::new(variant, rng)
                }
                None => {
                    // Board is too full; deal an unchecked shape so the round still completes.
                    stats.fallbacks += 1;
                    let kind = CATALOG[rng.random_range(0..CATALOG.len())];
                    PieceInstance::new(kind.shape(), rng)
                }
            };
            pieces.push(piece);
        }

        pieces.shuffle(rng);
        (pieces, stats)
    }

    /// Draw catalog shapes until one has a rotation that fits somewhere
    ///
    /// Returns the fitting variant and its first-fit position, plus the
    /// number of draws made.
    fn find_fit<R: Rng + ?Sized>(
        &self,
        working: &SimulatedBoard,
        rng: &mut R,
    ) -> (Option<(Shape, Position)>, u32) {
        let mut attempts = 0;
        while attempts < self.max_attempts {
            attempts += 1;
            let kind = CATALOG[rng.random_range(0..CATALOG.len())];
            let mut variants = all_rotations(&kind.shape());
            variants.shuffle(rng);

            for variant in variants {
                if let Some(pos) = find_first_valid_position(working.grid(), &variant) {
                    return (Some((variant, pos)), attempts);
                }
            }
        }
        (None, attempts)
    }
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Grid;
    use crate::types::{GRID_SIZE, SLOT_COUNT};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_same_seed_same_round() {
        let board = Board::new();
        let generator = PieceGenerator::new();
        let a = generator.generate(SLOT_COUNT, &board, &mut ChaCha8Rng::seed_from_u64(7));
        let b = generator.generate(SLOT_COUNT, &board, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_board_needs_one_draw_per_piece() {
        let board = Board::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (pieces, stats) = PieceGenerator::new().generate_with_stats(SLOT_COUNT, &board, &mut rng);
        assert_eq!(pieces.len(), SLOT_COUNT);
        assert_eq!(stats.attempts, SLOT_COUNT as u32);
        assert_eq!(stats.fallbacks, 0);
    }

    #[test]
    fn test_full_board_falls_back_after_attempt_limit() {
        let board = Board::from_grid(Grid::from_rows([[1u8; GRID_SIZE]; GRID_SIZE]));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (pieces, stats) = PieceGenerator::new().generate_with_stats(SLOT_COUNT, &board, &mut rng);
        assert_eq!(pieces.len(), SLOT_COUNT);
        assert_eq!(stats.attempts, MAX_GENERATION_ATTEMPTS * SLOT_COUNT as u32);
        assert_eq!(stats.fallbacks, SLOT_COUNT as u32);
    }

    #[test]
    fn test_generation_leaves_board_untouched() {
        let mut rows = [[0u8; GRID_SIZE]; GRID_SIZE];
        rows[3] = [1, 1, 1, 1, 1, 1, 1, 0];
        let board = Board::from_grid(Grid::from_rows(rows));
        let before = board.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let _ = PieceGenerator::new().generate(SLOT_COUNT, &board, &mut rng);
        assert_eq!(board, before);
    }
}

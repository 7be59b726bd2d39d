//! Session module - authoritative placement, scoring and round lifecycle
//!
//! A [`SessionRecord`] is plain data: board, score, the three piece slots and
//! the lifecycle state. [`GameSession`] is the stateless service that moves a
//! record from one valid state to the next. Every operation validates fully
//! before its first write, so a rejected call leaves the record untouched.
//!
//! Round flow:
//!
//! 1. [`GameSession::start`] deals the first round onto an empty board.
//! 2. [`GameSession::place_piece`] consumes one held piece per call.
//! 3. Once all slots are empty the caller asks for
//!    [`GameSession::replenish`]; placement never deals on its own.
//!
//! After each placement that leaves pieces in hand, and after each
//! replenishment, the session ends if none of the held pieces fits anywhere.

use rand::Rng;

use crate::board::{find_first_valid_position, Board, Grid, LineClear};
use crate::error::GameError;
use crate::generator::{PieceGenerator, PieceInstance};
use crate::scoring::{calculate_score, ScoreResult};
use crate::shapes::Shape;
use crate::snapshot::SessionSnapshot;
use crate::types::{Lifecycle, Position, SLOT_COUNT};

/// The three piece slots of a round
///
/// A slot that has been played stays empty until the whole set is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotSet {
    slots: [Option<PieceInstance>; SLOT_COUNT],
}

impl SlotSet {
    /// Fill slots in order; missing entries stay empty, extras are dropped
    pub fn from_pieces(pieces: impl IntoIterator<Item = PieceInstance>) -> Self {
        let mut set = Self::default();
        for (slot, piece) in set.slots.iter_mut().zip(pieces) {
            *slot = Some(piece);
        }
        set
    }

    pub fn slots(&self) -> &[Option<PieceInstance>; SLOT_COUNT] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&PieceInstance> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// Pieces still in hand, in slot order
    pub fn held(&self) -> impl Iterator<Item = &PieceInstance> {
        self.slots.iter().flatten()
    }

    /// Number of non-empty slots
    pub fn remaining(&self) -> usize {
        self.held().count()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Index of the first non-empty slot whose shape equals `shape`
    pub fn find_matching(&self, shape: &Shape) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|p| p.matches(shape)))
    }

    fn take(&mut self, index: usize) -> Option<PieceInstance> {
        self.slots.get_mut(index).and_then(Option::take)
    }
}

/// One player's game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    board: Board,
    score: u32,
    slots: SlotSet,
    lifecycle: Lifecycle,
}

impl SessionRecord {
    /// Assemble a record from existing parts
    ///
    /// The lifecycle is evaluated from the board and held pieces, so a record
    /// whose pieces cannot fit starts out Over.
    pub fn from_parts(board: Board, score: u32, slots: SlotSet) -> Self {
        let lifecycle = evaluate_lifecycle(board.grid(), &slots);
        Self {
            board,
            score,
            slots,
            lifecycle,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_game_over(&self) -> bool {
        self.lifecycle.is_over()
    }

    /// Read-only copy of the current state
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            grid: *self.board.grid(),
            score: self.score,
            slots: self.slots.clone(),
            lifecycle: self.lifecycle,
        }
    }
}

/// Result of a successful placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOutcome {
    /// Board after placement and line clears.
    pub grid: Grid,
    pub score: u32,
    pub slots: SlotSet,
    /// Lines completed by this placement (already cleared from `grid`).
    pub line_clear: LineClear,
    pub points: ScoreResult,
    pub lifecycle: Lifecycle,
    /// All slots are empty; the caller should request a new round.
    pub needs_replenish: bool,
}

/// Whether no held piece fits anywhere on `grid`
///
/// An empty hand is never game over; it is waiting for a new round.
pub fn is_stuck(grid: &Grid, slots: &SlotSet) -> bool {
    !slots.is_empty()
        && slots
            .held()
            .all(|piece| find_first_valid_position(grid, &piece.shape).is_none())
}

fn evaluate_lifecycle(grid: &Grid, slots: &SlotSet) -> Lifecycle {
    if is_stuck(grid, slots) {
        Lifecycle::Over
    } else {
        Lifecycle::Active
    }
}

/// Stateless game rules over [`SessionRecord`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct GameSession {
    generator: PieceGenerator,
}

impl GameSession {
    /// New game on an empty board with a freshly dealt round
    pub fn start<R: Rng + ?Sized>(&self, rng: &mut R) -> SessionRecord {
        self.start_with_board(Board::new(), rng)
    }

    /// New game on `board` with a freshly dealt round
    pub fn start_with_board<R: Rng + ?Sized>(&self, board: Board, rng: &mut R) -> SessionRecord {
        let pieces = self.generator.generate(SLOT_COUNT, &board, rng);
        SessionRecord::from_parts(board, 0, SlotSet::from_pieces(pieces))
    }

    /// Place the held piece whose shape equals `shape` at `pos`
    ///
    /// Scores one point per filled cell, then the line bonus for every full
    /// row and column, clears those lines and empties the matched slot.
    pub fn place_piece(
        &self,
        record: &mut SessionRecord,
        shape: &Shape,
        pos: Position,
    ) -> Result<PlaceOutcome, GameError> {
        if record.lifecycle.is_over() {
            return Err(GameError::SessionOver);
        }
        let slot = record
            .slots
            .find_matching(shape)
            .ok_or(GameError::InvalidPiece)?;
        if !record.board.can_place(shape, pos) {
            return Err(GameError::InvalidPlacement {
                row: pos.row,
                col: pos.col,
            });
        }

        // Validated; everything below mutates.
        if !record.board.place(shape, pos) {
            return Err(GameError::Internal(
                "placement rejected after validation".to_string(),
            ));
        }
        let line_clear = record.board.detect_full_lines();
        let points = calculate_score(shape.block_count(), line_clear.line_count());
        record.score = record.score.saturating_add(points.total);
        record.board.clear_lines(&line_clear);
        record.slots.take(slot);
        record.lifecycle = evaluate_lifecycle(record.board.grid(), &record.slots);

        Ok(PlaceOutcome {
            grid: *record.board.grid(),
            score: record.score,
            slots: record.slots.clone(),
            line_clear,
            points,
            lifecycle: record.lifecycle,
            needs_replenish: record.slots.is_empty(),
        })
    }

    /// Deal a new round once every slot is empty
    pub fn replenish<R: Rng + ?Sized>(
        &self,
        record: &mut SessionRecord,
        rng: &mut R,
    ) -> Result<SlotSet, GameError> {
        if record.lifecycle.is_over() {
            return Err(GameError::SessionOver);
        }
        let remaining = record.slots.remaining();
        if remaining > 0 {
            return Err(GameError::PrematureReplenish { remaining });
        }

        let pieces = self.generator.generate(SLOT_COUNT, &record.board, rng);
        record.slots = SlotSet::from_pieces(pieces);
        record.lifecycle = evaluate_lifecycle(record.board.grid(), &record.slots);
        Ok(record.slots.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;
    use crate::types::GRID_SIZE;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hand(kinds: &[ShapeKind], rng: &mut ChaCha8Rng) -> SlotSet {
        SlotSet::from_pieces(kinds.iter().map(|k| PieceInstance::new(k.shape(), rng)))
    }

    #[test]
    fn test_start_deals_full_round() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let record = GameSession::default().start(&mut rng);
        assert_eq!(record.slots().remaining(), SLOT_COUNT);
        assert_eq!(record.score(), 0);
        assert_eq!(record.board().grid().filled_count(), 0);
        assert!(record.lifecycle().is_active());
    }

    #[test]
    fn test_rejected_placement_leaves_record_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let slots = hand(&[ShapeKind::I4, ShapeKind::T, ShapeKind::Z], &mut rng);
        let mut record = SessionRecord::from_parts(Board::new(), 0, slots);
        let before = record.clone();
        let service = GameSession::default();

        let err = service
            .place_piece(&mut record, &ShapeKind::I4.shape(), Position::new(0, 5))
            .unwrap_err();
        assert_eq!(err, GameError::InvalidPlacement { row: 0, col: 5 });

        let err = service
            .place_piece(&mut record, &ShapeKind::Square3.shape(), Position::new(0, 0))
            .unwrap_err();
        assert_eq!(err, GameError::InvalidPiece);

        assert_eq!(record, before);
    }

    #[test]
    fn test_last_piece_signals_replenish_without_game_over_check() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let slots = hand(&[ShapeKind::I1], &mut rng);
        let mut record = SessionRecord::from_parts(Board::new(), 0, slots);

        let outcome = GameSession::default()
            .place_piece(&mut record, &ShapeKind::I1.shape(), Position::new(0, 0))
            .unwrap();
        assert!(outcome.needs_replenish);
        assert!(outcome.lifecycle.is_active());
    }

    #[test]
    fn test_over_session_rejects_everything() {
        let mut rows = [[1u8; GRID_SIZE]; GRID_SIZE];
        rows[0][0] = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let slots = hand(&[ShapeKind::Square2], &mut rng);
        let mut record = SessionRecord::from_parts(Board::from_grid(Grid::from_rows(rows)), 7, slots);
        assert!(record.is_game_over());

        let service = GameSession::default();
        assert_eq!(
            service.place_piece(&mut record, &ShapeKind::Square2.shape(), Position::new(0, 0)),
            Err(GameError::SessionOver)
        );
        assert_eq!(service.replenish(&mut record, &mut rng), Err(GameError::SessionOver));
        assert_eq!(record.score(), 7);
    }
}

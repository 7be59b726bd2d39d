//! Scoring module - placement points and line-clear bonus
//!
//! Every filled cell of a placed piece is worth one point. Clearing lines adds
//! `lines * 10 + 2 * lines * (lines - 1)`, where `lines` counts full rows and
//! full columns separately (a crossing cell does not reduce the count).

use crate::types::{LINE_BASE_POINTS, LINE_COMBO_POINTS};

/// Score calculation result for one placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// One point per filled cell of the placed piece.
    pub block_points: u32,
    /// Bonus for the lines completed by the placement.
    pub line_bonus: u32,
    pub total: u32,
}

/// Bonus for clearing `lines` lines at once
pub fn calculate_line_bonus(lines: u32) -> u32 {
    if lines == 0 {
        return 0;
    }
    let base = lines.saturating_mul(LINE_BASE_POINTS);
    let combo = LINE_COMBO_POINTS
        .saturating_mul(lines)
        .saturating_mul(lines - 1);
    base.saturating_add(combo)
}

/// Points for placing a piece with `block_count` cells that completes `lines` lines
pub fn calculate_score(block_count: u32, lines: u32) -> ScoreResult {
    let line_bonus = calculate_line_bonus(lines);
    ScoreResult {
        block_points: block_count,
        line_bonus,
        total: block_count.saturating_add(line_bonus),
    }
}

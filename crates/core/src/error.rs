//! Error taxonomy for session, placement and leaderboard operations
//!
//! Every variant is a local, recoverable rejection: the operation that
//! produced it left the session and leaderboard exactly as they were.

use crate::shapes::ShapeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("piece does not match any held piece")]
    InvalidPiece,
    #[error("piece does not fit at row {row}, col {col}")]
    InvalidPlacement { row: i32, col: i32 },
    #[error("{remaining} piece(s) must be placed before new pieces are dealt")]
    PrematureReplenish { remaining: usize },
    #[error("score {score} does not beat the current record of {current}")]
    RecordNotHigher { score: u32, current: u32 },
    #[error("game is over")]
    SessionOver,
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Wire code for this error
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "not_found",
            GameError::InvalidRequest(_) => "invalid_request",
            GameError::InvalidPiece => "invalid_piece",
            GameError::InvalidPlacement { .. } => "invalid_placement",
            GameError::PrematureReplenish { .. } => "premature_replenish",
            GameError::RecordNotHigher { .. } => "record_not_higher",
            GameError::SessionOver => "session_over",
            GameError::Internal(_) => "internal",
        }
    }
}

impl From<ShapeError> for GameError {
    fn from(err: ShapeError) -> Self {
        match err {
            // Well-formed, but no slot can ever hold it.
            ShapeError::TooLarge => GameError::InvalidPiece,
            other => GameError::InvalidRequest(other.to_string()),
        }
    }
}

//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules, state management, and piece
//! dealing. It has **no dependencies** on networking or I/O, making it:
//!
//! - **Deterministic**: randomness is always passed in, so a seeded RNG
//!   reproduces a game exactly
//! - **Testable**: every rule is reachable without a server
//! - **Portable**: usable from the TCP adapter, a bench, or a headless bot
//!
//! # Module Structure
//!
//! - [`shapes`]: the 11-shape catalog and the clockwise rotation transform
//! - [`board`]: 8x8 grid with placement checks and full-line detection/clearing,
//!   plus the detached [`SimulatedBoard`] used for lookahead
//! - [`generator`]: feasibility-biased dealing of a round of pieces
//! - [`scoring`]: placement points and line-clear bonus
//! - [`session`]: the authoritative placement/replenishment service
//! - [`store`]: keyed session storage with per-session locking
//! - [`leaderboard`]: the single global high-score record
//!
//! # Game Rules
//!
//! - Each round deals **3 pieces**; a piece is consumed when placed
//! - New pieces are dealt only once all three slots are empty
//! - Full rows and full columns clear simultaneously
//! - Scoring: 1 point per cell, plus `10n + 2n(n-1)` for `n` lines
//! - The game ends when none of the held pieces fits anywhere
//!
//! # Example
//!
//! ```
//! use block_puzzle_core::{GameSession, ShapeKind};
//! use block_puzzle_types::Position;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(12345);
//! let service = GameSession::default();
//! let mut record = service.start(&mut rng);
//!
//! // Play whichever piece sits in the first slot at the top-left corner.
//! let shape = record.slots().held().next().unwrap().shape.clone();
//! let outcome = service.place_piece(&mut record, &shape, Position::new(0, 0)).unwrap();
//! assert_eq!(outcome.score, shape.block_count());
//! ```

pub mod board;
pub mod error;
pub mod generator;
pub mod leaderboard;
pub mod scoring;
pub mod session;
pub mod shapes;
pub mod snapshot;
pub mod store;

pub use block_puzzle_types as types;

// Re-export commonly used types for convenience
pub use board::{find_first_valid_position, Board, Grid, LineClear, SimulatedBoard};
pub use error::GameError;
pub use generator::{GenerationStats, PieceGenerator, PieceId, PieceInstance};
pub use leaderboard::{normalize_player_name, Leaderboard, LeaderboardRecord};
pub use scoring::{calculate_line_bonus, calculate_score, ScoreResult};
pub use session::{is_stuck, GameSession, PlaceOutcome, SessionRecord, SlotSet};
pub use shapes::{all_rotations, Shape, ShapeError, ShapeKind, CATALOG};
pub use snapshot::SessionSnapshot;
pub use store::{SessionId, SessionStore};

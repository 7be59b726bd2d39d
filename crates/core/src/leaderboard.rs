//! Leaderboard module - the single global high-score record
//!
//! Only the best record is kept. A submission replaces it only when its score
//! is strictly greater; the comparison and the replacement happen under one
//! lock, so of two racing submissions the loser is told which record beat it.

use std::sync::Mutex;

use crate::error::GameError;
use crate::types::{DEFAULT_PLAYER_NAME, MAX_PLAYER_NAME_CHARS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRecord {
    pub name: String,
    pub score: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Trim a submitted name, fall back to the placeholder and cap its length
pub fn normalize_player_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    trimmed.chars().take(MAX_PLAYER_NAME_CHARS).collect()
}

#[derive(Debug, Default)]
pub struct Leaderboard {
    record: Mutex<Option<LeaderboardRecord>>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted record
    pub fn with_record(record: Option<LeaderboardRecord>) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    /// Current top record, if any
    pub fn top(&self) -> Result<Option<LeaderboardRecord>, GameError> {
        self.record
            .lock()
            .map(|record| record.clone())
            .map_err(|_| GameError::Internal("leaderboard lock poisoned".to_string()))
    }

    /// Compare-and-replace the top record
    ///
    /// Fails with [`GameError::RecordNotHigher`] when a stored record has an
    /// equal or higher score.
    pub fn submit(
        &self,
        name: &str,
        score: u32,
        timestamp_ms: u64,
    ) -> Result<LeaderboardRecord, GameError> {
        self.submit_with(name, score, timestamp_ms, |_| {})
    }

    /// Same as [`Leaderboard::submit`], running `persist` on the new record
    /// before the lock is released
    ///
    /// Writers therefore reach durable storage in score order: the last
    /// `persist` call always carries the current top record.
    pub fn submit_with(
        &self,
        name: &str,
        score: u32,
        timestamp_ms: u64,
        persist: impl FnOnce(&LeaderboardRecord),
    ) -> Result<LeaderboardRecord, GameError> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| GameError::Internal("leaderboard lock poisoned".to_string()))?;

        if let Some(current) = record.as_ref() {
            if score <= current.score {
                return Err(GameError::RecordNotHigher {
                    score,
                    current: current.score,
                });
            }
        }

        let new_record = LeaderboardRecord {
            name: normalize_player_name(name),
            score,
            timestamp_ms,
        };
        persist(&new_record);
        *record = Some(new_record.clone());
        Ok(new_record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_submission_always_wins() {
        let board = Leaderboard::new();
        assert_eq!(board.top().unwrap(), None);
        let rec = board.submit("  ada  ", 0, 1).unwrap();
        assert_eq!(rec.name, "ada");
        assert_eq!(board.top().unwrap(), Some(rec));
    }

    #[test]
    fn test_equal_score_is_rejected() {
        let board = Leaderboard::new();
        board.submit("ada", 120, 1).unwrap();
        let err = board.submit("bob", 120, 2).unwrap_err();
        assert_eq!(
            err,
            GameError::RecordNotHigher {
                score: 120,
                current: 120
            }
        );
        assert_eq!(board.top().unwrap().unwrap().name, "ada");
    }

    #[test]
    fn test_persist_runs_only_for_winning_submissions() {
        let board = Leaderboard::new();
        let mut persisted = Vec::new();
        board
            .submit_with("ada", 10, 1, |rec| persisted.push(rec.score))
            .unwrap();
        let _ = board.submit_with("bob", 5, 2, |rec| persisted.push(rec.score));
        assert_eq!(persisted, vec![10]);
    }

    #[test]
    fn test_blank_name_gets_placeholder() {
        assert_eq!(normalize_player_name("   "), DEFAULT_PLAYER_NAME);
        let long = "x".repeat(100);
        assert_eq!(normalize_player_name(&long).chars().count(), MAX_PLAYER_NAME_CHARS);
    }
}

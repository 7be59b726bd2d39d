//! Session service - the operations behind each protocol request
//!
//! Owns the session store, the leaderboard and the seed source. Every
//! session carries its own `ChaCha8Rng`, seeded from the service's master
//! RNG when the session is created, so one session's dealing never depends
//! on traffic in another.

use std::path::PathBuf;
use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{
    GameError, GameSession, Leaderboard, LeaderboardRecord, PlaceOutcome, SessionId,
    SessionRecord, SessionSnapshot, SessionStore, Shape,
};
use crate::protocol::current_timestamp_ms;
use crate::record_file::RecordFile;
use crate::types::Position;

/// Construction options for [`SessionService`]
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Master seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub max_sessions: usize,
    /// Where the top record is persisted; `None` keeps it in memory only.
    pub record_path: Option<PathBuf>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_sessions: 1024,
            record_path: None,
        }
    }
}

struct SessionEntry {
    record: SessionRecord,
    rng: ChaCha8Rng,
}

pub struct SessionService {
    game: GameSession,
    store: SessionStore<SessionEntry>,
    leaderboard: Leaderboard,
    seeder: Mutex<ChaCha8Rng>,
    record_file: Option<RecordFile>,
}

impl SessionService {
    pub fn new(options: ServiceOptions) -> Self {
        let seeder = match options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let record_file = options.record_path.map(RecordFile::new);
        let stored = record_file.as_ref().and_then(RecordFile::load);
        if let Some(rec) = stored.as_ref() {
            println!("[Records] Loaded top record {} by {}", rec.score, rec.name);
        }

        Self {
            game: GameSession::default(),
            store: SessionStore::new(options.max_sessions),
            leaderboard: Leaderboard::with_record(stored),
            seeder: Mutex::new(seeder),
            record_file,
        }
    }

    /// Deterministic in-memory service, for tests and benches
    pub fn with_seed(seed: u64) -> Self {
        Self::new(ServiceOptions {
            seed: Some(seed),
            ..ServiceOptions::default()
        })
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    fn next_seed(&self) -> Result<u64, GameError> {
        self.seeder
            .lock()
            .map(|mut rng| rng.random())
            .map_err(|_| GameError::Internal("seed source lock poisoned".to_string()))
    }

    fn fresh_session_id(&self) -> Result<SessionId, GameError> {
        loop {
            let id = SessionId::from_u64(self.next_seed()?);
            if !self.store.contains(&id) {
                return Ok(id);
            }
        }
    }

    /// Start a new game
    ///
    /// With a non-blank `session_id` the game is stored under that id,
    /// replacing whatever was there; otherwise a fresh id is generated.
    pub fn init(
        &self,
        session_id: Option<&str>,
    ) -> Result<(SessionId, SessionSnapshot), GameError> {
        let id = match session_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(requested) => SessionId::new(requested),
            None => self.fresh_session_id()?,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(self.next_seed()?);
        let record = self.game.start(&mut rng);
        let snapshot = record.snapshot();

        if let Some(evicted) = self.store.insert(id.clone(), SessionEntry { record, rng })? {
            println!("[Session] {} evicted", evicted);
        }
        println!("[Session] {} started", id);
        Ok((id, snapshot))
    }

    /// Place a held piece at (row, col)
    pub fn place(
        &self,
        session_id: &str,
        shape: &Shape,
        row: i32,
        col: i32,
    ) -> Result<PlaceOutcome, GameError> {
        let id = SessionId::new(session_id);
        let outcome = self.store.with_session(&id, |entry| {
            self.game
                .place_piece(&mut entry.record, shape, Position::new(row, col))
        })?;
        if outcome.lifecycle.is_over() {
            println!("[Session] {} game over with score {}", id, outcome.score);
        }
        Ok(outcome)
    }

    /// Deal a new round once all three pieces are placed
    pub fn request_new_pieces(&self, session_id: &str) -> Result<SessionSnapshot, GameError> {
        let id = SessionId::new(session_id);
        let snapshot = self.store.with_session(&id, |entry| {
            self.game.replenish(&mut entry.record, &mut entry.rng)?;
            Ok(entry.record.snapshot())
        })?;
        if snapshot.is_game_over() {
            println!("[Session] {} game over with score {}", id, snapshot.score);
        }
        Ok(snapshot)
    }

    pub fn get_state(&self, session_id: &str) -> Result<SessionSnapshot, GameError> {
        let id = SessionId::new(session_id);
        self.store
            .with_session(&id, |entry| Ok(entry.record.snapshot()))
    }

    pub fn top_record(&self) -> Result<Option<LeaderboardRecord>, GameError> {
        self.leaderboard.top()
    }

    /// Replace the top record if `score` beats it
    ///
    /// A successful replacement is written through to the record file when
    /// one is configured; a failed write is logged and the in-memory record
    /// still stands.
    pub fn save_top_record(&self, name: &str, score: u32) -> Result<LeaderboardRecord, GameError> {
        // The file is written under the leaderboard lock so it never trails a
        // lower score behind the in-memory record.
        let record = self
            .leaderboard
            .submit_with(name, score, current_timestamp_ms(), |record| {
                let Some(file) = self.record_file.as_ref() else {
                    return;
                };
                if let Err(err) = file.save(Some(record)) {
                    eprintln!(
                        "[Records] Failed to persist to {}: {}",
                        file.path().display(),
                        err
                    );
                }
            })?;
        println!("[Records] New top record {} by {}", record.score, record.name);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ShapeKind;

    #[test]
    fn init_generates_distinct_ids() {
        let service = SessionService::with_seed(1);
        let (a, _) = service.init(None).unwrap();
        let (b, _) = service.init(None).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 16);
        assert_eq!(service.session_count(), 2);
    }

    #[test]
    fn init_with_existing_id_restarts_session() {
        let service = SessionService::with_seed(2);
        let (id, first) = service.init(Some("table-1")).unwrap();
        assert_eq!(id.as_str(), "table-1");

        let shape = first.slots.held().next().unwrap().shape.clone();
        service.place("table-1", &shape, 0, 0).unwrap();
        assert!(service.get_state("table-1").unwrap().score > 0);

        let (_, restarted) = service.init(Some("table-1")).unwrap();
        assert_eq!(restarted.score, 0);
        assert_eq!(restarted.grid.filled_count(), 0);
        assert_eq!(service.session_count(), 1);
    }

    #[test]
    fn same_seed_deals_same_opening() {
        let a = SessionService::with_seed(77).init(None).unwrap();
        let b = SessionService::with_seed(77).init(None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_session_is_not_found() {
        let service = SessionService::with_seed(3);
        let shape = ShapeKind::I1.shape();
        assert!(matches!(
            service.place("missing", &shape, 0, 0),
            Err(GameError::NotFound(_))
        ));
        assert!(matches!(
            service.request_new_pieces("missing"),
            Err(GameError::NotFound(_))
        ));
        assert!(matches!(
            service.get_state("missing"),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn early_replenish_reports_remaining() {
        let service = SessionService::with_seed(4);
        let (id, _) = service.init(None).unwrap();
        assert_eq!(
            service.request_new_pieces(id.as_str()).unwrap_err(),
            GameError::PrematureReplenish { remaining: 3 }
        );
    }

    #[test]
    fn top_record_needs_strictly_higher_score() {
        let service = SessionService::with_seed(5);
        assert_eq!(service.top_record().unwrap(), None);
        service.save_top_record("", 50).unwrap();
        assert_eq!(service.top_record().unwrap().unwrap().name, "Anonymous");
        assert!(matches!(
            service.save_top_record("bob", 50),
            Err(GameError::RecordNotHigher { current: 50, .. })
        ));
        assert_eq!(service.save_top_record("bob", 51).unwrap().score, 51);
    }

    #[test]
    fn persisted_record_matches_top_under_contention() {
        use std::time::{SystemTime, UNIX_EPOCH};

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("block_puzzle_contention_{nanos}.json"));
        let service = SessionService::new(ServiceOptions {
            seed: Some(6),
            record_path: Some(path.clone()),
            ..ServiceOptions::default()
        });

        std::thread::scope(|s| {
            for t in 0..8u32 {
                let service = &service;
                s.spawn(move || {
                    for i in 0..50u32 {
                        let _ = service.save_top_record("bot", i * 8 + t);
                    }
                });
            }
        });

        let top = service.top_record().unwrap();
        assert_eq!(top.as_ref().map(|r| r.score), Some(399));
        assert_eq!(RecordFile::new(&path).load(), top);

        // A restarted service picks up the same record.
        let restarted = SessionService::new(ServiceOptions {
            record_path: Some(path.clone()),
            ..ServiceOptions::default()
        });
        assert_eq!(restarted.top_record().unwrap(), top);

        let _ = std::fs::remove_file(&path);
    }
}

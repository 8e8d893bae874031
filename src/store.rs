use crate::error::{QuizError, Result};
use crate::factor::Classification;
use crate::session::{Difficulty, Mode, PlayerSession};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

/// One graded round, as kept in the history log
#[derive(Debug, Clone, PartialEq)]
pub struct RoundLogEntry {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub number: u64,
    pub guess: Option<Classification>,
    pub was_correct: bool,
    pub time_taken_ms: u64,
    pub timestamp: DateTime<Local>,
}

/// Lifetime answer statistics for one difficulty
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyHistory {
    pub difficulty: Difficulty,
    pub rounds: u64,
    pub correct: u64,
    pub avg_time_ms: Option<f64>,
}

impl DifficultyHistory {
    /// Percentage of correct answers
    pub fn accuracy(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            (self.correct as f64 / self.rounds as f64) * 100.0
        }
    }
}

/// Per-player persistence. Each player key owns its session exclusively.
pub trait SessionStore {
    /// Unknown players load as idle with empty records.
    fn load(&self, player: &str) -> Result<PlayerSession>;
    fn save(&mut self, player: &str, session: &PlayerSession) -> Result<()>;

    fn record_round(&mut self, _player: &str, _entry: &RoundLogEntry) -> Result<()> {
        Ok(())
    }

    /// One entry per difficulty the player has answered at, easiest first
    fn history(&self, _player: &str) -> Result<Vec<DifficultyHistory>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: HashMap<String, PlayerSession>,
    rounds: Vec<(String, RoundLogEntry)>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, player: &str) -> Result<PlayerSession> {
        Ok(self.sessions.get(player).cloned().unwrap_or_default())
    }

    fn save(&mut self, player: &str, session: &PlayerSession) -> Result<()> {
        self.sessions.insert(player.to_string(), session.clone());
        Ok(())
    }

    fn record_round(&mut self, player: &str, entry: &RoundLogEntry) -> Result<()> {
        self.rounds.push((player.to_string(), entry.clone()));
        Ok(())
    }

    fn history(&self, player: &str) -> Result<Vec<DifficultyHistory>> {
        let mut history = Vec::new();
        for difficulty in Difficulty::ALL {
            let entries: Vec<&RoundLogEntry> = self
                .rounds
                .iter()
                .filter(|(p, e)| p == player && e.difficulty == difficulty)
                .map(|(_, e)| e)
                .collect();
            if entries.is_empty() {
                continue;
            }
            let total_ms: u64 = entries.iter().map(|e| e.time_taken_ms).sum();
            history.push(DifficultyHistory {
                difficulty,
                rounds: entries.len() as u64,
                correct: entries.iter().filter(|e| e.was_correct).count() as u64,
                avg_time_ms: Some(total_ms as f64 / entries.len() as f64),
            });
        }
        Ok(history)
    }
}

/// SQLite-backed store: one JSON payload per player plus the round log
#[derive(Debug)]
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path`, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                player TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS round_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player TEXT NOT NULL,
                mode TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                number INTEGER NOT NULL,
                guess TEXT,
                was_correct BOOLEAN NOT NULL,
                time_taken_ms INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_round_log_player ON round_log(player, difficulty)",
            [],
        )?;

        Ok(Self { conn })
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, player: &str) -> Result<PlayerSession> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM sessions WHERE player = ?1",
                [player],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => serde_json::from_str(&json).map_err(QuizError::from),
            None => Ok(PlayerSession::default()),
        }
    }

    fn save(&mut self, player: &str, session: &PlayerSession) -> Result<()> {
        let payload = serde_json::to_string(session)?;
        self.conn.execute(
            r#"
            INSERT INTO sessions (player, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(player) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            params![player, payload, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn record_round(&mut self, player: &str, entry: &RoundLogEntry) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO round_log
            (player, mode, difficulty, number, guess, was_correct, time_taken_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                player,
                entry.mode.to_string(),
                entry.difficulty.to_string(),
                entry.number,
                entry.guess.map(|g| g.to_string()),
                entry.was_correct,
                entry.time_taken_ms,
                entry.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn history(&self, player: &str) -> Result<Vec<DifficultyHistory>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                difficulty,
                COUNT(*) as rounds,
                SUM(CASE WHEN was_correct = 1 THEN 1 ELSE 0 END) as correct,
                AVG(time_taken_ms) as avg_time
            FROM round_log
            WHERE player = ?1
            GROUP BY difficulty
            "#,
        )?;

        let rows = stmt.query_map([player], |row| {
            let difficulty: String = row.get(0)?;
            Ok(DifficultyHistory {
                difficulty: Difficulty::from_name(&difficulty),
                rounds: row.get(1)?,
                correct: row.get(2)?,
                avg_time_ms: row.get(3)?,
            })
        })?;

        let mut history = Vec::new();
        for item in rows {
            history.push(item?);
        }
        history.sort_by_key(|h| h.difficulty.index());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::{Phase, Round, SessionState};
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn entry(difficulty: Difficulty, was_correct: bool, time_taken_ms: u64) -> RoundLogEntry {
        RoundLogEntry {
            mode: Mode::FixedCount,
            difficulty,
            number: 91,
            guess: Some(Classification::Composite),
            was_correct,
            time_taken_ms,
            timestamp: Local::now(),
        }
    }

    fn busy_session() -> PlayerSession {
        let config = Config::default();
        let mut session = PlayerSession::default();
        let mut state = SessionState::new(Mode::FixedCount, Difficulty::Late, &config);
        state.streak = 3;
        state.total_score = 12345;
        state.phase = Phase::Pending(Round {
            number: 10007,
            presented_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        });
        session.state = Some(state);
        session
            .records
            .try_update_score(Mode::FixedDuration, Difficulty::Early, 640);
        session.records.try_update_time(Difficulty::Late, 42.5, true);
        session
    }

    #[test]
    fn test_memory_unknown_player_is_idle() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load("nobody").unwrap(), PlayerSession::default());
    }

    #[test]
    fn test_memory_roundtrip_and_isolation() {
        let mut store = MemorySessionStore::new();
        let session = busy_session();
        store.save("alice", &session).unwrap();
        assert_eq!(store.load("alice").unwrap(), session);
        assert_eq!(store.load("bob").unwrap(), PlayerSession::default());
    }

    #[test]
    fn test_memory_history() {
        let mut store = MemorySessionStore::new();
        store.record_round("alice", &entry(Difficulty::Mid, true, 1000)).unwrap();
        store.record_round("alice", &entry(Difficulty::Mid, false, 3000)).unwrap();
        store.record_round("alice", &entry(Difficulty::Early, true, 500)).unwrap();
        store.record_round("bob", &entry(Difficulty::Late, true, 500)).unwrap();

        let history = store.history("alice").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].difficulty, Difficulty::Early);
        assert_eq!(history[1].difficulty, Difficulty::Mid);
        assert_eq!(history[1].rounds, 2);
        assert_eq!(history[1].correct, 1);
        assert_eq!(history[1].accuracy(), 50.0);
        assert_eq!(history[1].avg_time_ms, Some(2000.0));
    }

    #[test]
    fn test_sqlite_unknown_player_is_idle() {
        let store = SqliteSessionStore::open_in_memory().unwrap();
        assert_eq!(store.load("nobody").unwrap(), PlayerSession::default());
    }

    #[test]
    fn test_sqlite_roundtrip_and_overwrite() {
        let mut store = SqliteSessionStore::open_in_memory().unwrap();
        let mut session = busy_session();
        store.save("alice", &session).unwrap();
        assert_eq!(store.load("alice").unwrap(), session);

        session.state = None;
        store.save("alice", &session).unwrap();
        let loaded = store.load("alice").unwrap();
        assert_eq!(loaded.state, None);
        assert_eq!(loaded.records.best_time(Difficulty::Late), Some(42.5));
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("sessions.db");
        let session = busy_session();
        {
            let mut store = SqliteSessionStore::open(&path).unwrap();
            store.save("alice", &session).unwrap();
            store
                .record_round("alice", &entry(Difficulty::Late, true, 1200))
                .unwrap();
        }

        let store = SqliteSessionStore::open(&path).unwrap();
        assert_eq!(store.load("alice").unwrap(), session);
        assert_eq!(store.history("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_sqlite_history() {
        let mut store = SqliteSessionStore::open_in_memory().unwrap();
        for (difficulty, ok, ms) in [
            (Difficulty::Late, true, 4000),
            (Difficulty::Early, true, 800),
            (Difficulty::Early, false, 1200),
            (Difficulty::Early, true, 1000),
        ] {
            store.record_round("alice", &entry(difficulty, ok, ms)).unwrap();
        }
        store.record_round("bob", &entry(Difficulty::Mid, true, 10)).unwrap();

        let history = store.history("alice").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].difficulty, Difficulty::Early);
        assert_eq!(history[0].rounds, 3);
        assert_eq!(history[0].correct, 2);
        assert_eq!(history[0].avg_time_ms, Some(1000.0));
        assert_eq!(history[1].difficulty, Difficulty::Late);
        assert_eq!(history[1].accuracy(), 100.0);
    }
}

//! SQLite-backed leaderboard.
//!
//! Only winning sessions are recorded. Entries rank by completion time,
//! fastest first, and the table is trimmed to the best `max_entries`
//! after every insert.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::session::LeaderboardEntry;

pub struct Leaderboard {
    conn: Connection,
    max_entries: u32,
}

impl Leaderboard {
    /// Open the leaderboard at `~/.config/lickrun/leaderboard.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(max_entries: u32) -> Result<Self> {
        Self::open_at(&data_dir()?.join("leaderboard.db"), max_entries)
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path, max_entries: u32) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, max_entries)
    }

    /// Open an in-memory leaderboard (for tests and throwaway sessions).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory(max_entries: u32) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, max_entries)
    }

    fn with_connection(conn: Connection, max_entries: u32) -> Result<Self> {
        let board = Self {
            conn,
            max_entries: max_entries.max(1),
        };
        board.migrate()?;
        Ok(board)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS leaderboard (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                completion_ms INTEGER NOT NULL,
                action_ms     INTEGER NOT NULL,
                recorded_at   TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_leaderboard_completion ON leaderboard(completion_ms, id);",
        )?;
        Ok(())
    }

    /// Insert a winning entry, then trim to `max_entries`.
    /// Returns the 1-based rank of the entry, or `None` if it was trimmed.
    ///
    /// # Errors
    /// Returns an error if the insert or trim fails.
    pub fn record(&self, entry: &LeaderboardEntry) -> Result<Option<usize>> {
        self.conn.execute(
            "INSERT INTO leaderboard (name, completion_ms, action_ms, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.name,
                entry.completion_ms as i64,
                entry.action_ms as i64,
                entry.timestamp.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.truncate()?;

        let ranked: Vec<i64> = {
            let mut stmt = self
                .conn
                .prepare("SELECT id FROM leaderboard ORDER BY completion_ms ASC, id ASC")?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            rows.collect::<Result<Vec<i64>, _>>()?
        };
        Ok(ranked.iter().position(|&r| r == id).map(|i| i + 1))
    }

    /// Fastest `count` entries.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn top(&self, count: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, completion_ms, action_ms, recorded_at
             FROM leaderboard
             ORDER BY completion_ms ASC, id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![count as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (name, completion_ms, action_ms, recorded_at) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&recorded_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp: {e}")))?;
            entries.push(LeaderboardEntry {
                name,
                completion_ms: completion_ms.max(0) as u64,
                action_ms: action_ms.max(0) as u64,
                timestamp,
            });
        }
        Ok(entries)
    }

    /// Keep only the best `max_entries`.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn truncate(&self) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM leaderboard WHERE id NOT IN (
                SELECT id FROM leaderboard ORDER BY completion_ms ASC, id ASC LIMIT ?1
             )",
            params![i64::from(self.max_entries)],
        )?;
        Ok(removed)
    }

    /// # Errors
    /// Returns an error if the count query fails.
    pub fn len(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM leaderboard", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// # Errors
    /// Returns an error if the count query fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// # Errors
    /// Returns an error if the delete fails.
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM leaderboard", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, completion_ms: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.into(),
            completion_ms,
            action_ms: 15_000,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn ranks_by_completion_time() {
        let board = Leaderboard::open_memory(10).unwrap();
        board.record(&entry("SugarRush", 48_000)).unwrap();
        board.record(&entry("SpeedLicker", 39_000)).unwrap();
        let rank = board.record(&entry("CandyMaster", 42_000)).unwrap();
        assert_eq!(rank, Some(2));

        let names: Vec<_> = board.top(5).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["SpeedLicker", "CandyMaster", "SugarRush"]);
    }

    #[test]
    fn trims_to_max_entries() {
        let board = Leaderboard::open_memory(3).unwrap();
        for (i, ms) in [30_000, 20_000, 40_000, 10_000].into_iter().enumerate() {
            board.record(&entry(&format!("p{i}"), ms)).unwrap();
        }
        assert_eq!(board.len().unwrap(), 3);
        let slow = board.record(&entry("slow", 90_000)).unwrap();
        assert_eq!(slow, None);
        let times: Vec<_> = board.top(10).unwrap().iter().map(|e| e.completion_ms).collect();
        assert_eq!(times, vec![10_000, 20_000, 30_000]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let board = Leaderboard::open_memory(10).unwrap();
        board.record(&entry("first", 40_000)).unwrap();
        board.record(&entry("second", 40_000)).unwrap();
        let top = board.top(2).unwrap();
        assert_eq!(top[0].name, "first");
        assert_eq!(top[1].name, "second");
    }

    #[test]
    fn clear_empties_board() {
        let board = Leaderboard::open_memory(10).unwrap();
        board.record(&entry("Ada", 40_000)).unwrap();
        assert_eq!(board.clear().unwrap(), 1);
        assert!(board.is_empty().unwrap());
    }

    #[test]
    fn persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaderboard.db");
        {
            let board = Leaderboard::open_at(&path, 10).unwrap();
            board.record(&entry("Ada", 41_500)).unwrap();
        }
        let board = Leaderboard::open_at(&path, 10).unwrap();
        let top = board.top(1).unwrap();
        assert_eq!(top[0].name, "Ada");
        assert_eq!(top[0].completion_secs(), 41);
    }
}

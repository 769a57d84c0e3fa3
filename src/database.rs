//! Client-local state that never goes to the server: empty collection
//! names and weekly reflections.

use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the local state database and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// In-memory database, used by tests and as a fallback.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS empty_collections (
                name            TEXT PRIMARY KEY,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS reflections (
                week_start      TEXT PRIMARY KEY,
                content         TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn now() -> String {
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Locally created collection names, oldest first
    pub fn empty_collections(&self) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM empty_collections ORDER BY created_at, rowid")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Remember a collection name. Returns false if it was already known.
    pub fn add_empty_collection(&self, name: &str) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO empty_collections (name, created_at) VALUES (?1, ?2)",
            rusqlite::params![name, Self::now()],
        )?;
        Ok(inserted > 0)
    }

    /// Forget a collection name. Returns false if it was not stored.
    pub fn remove_empty_collection(&self, name: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn
            .execute("DELETE FROM empty_collections WHERE name = ?1", [name])?;
        Ok(removed > 0)
    }

    /// Reflection saved for the week starting `week_start` (YYYY-MM-DD)
    pub fn reflection(&self, week_start: &str) -> Result<Option<String>, DatabaseError> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM reflections WHERE week_start = ?1",
                [week_start],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(content)
    }

    pub fn save_reflection(&self, week_start: &str, content: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO reflections (week_start, content, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(week_start) DO UPDATE
             SET content = excluded.content, updated_at = excluded.updated_at",
            rusqlite::params![week_start, content, Self::now()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collections_round_trip_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.add_empty_collection("Ideas").unwrap());
        assert!(db.add_empty_collection("Recipes").unwrap());
        assert!(!db.add_empty_collection("Ideas").unwrap());
        assert_eq!(db.empty_collections().unwrap(), vec!["Ideas", "Recipes"]);

        assert!(db.remove_empty_collection("Ideas").unwrap());
        assert!(!db.remove_empty_collection("Ideas").unwrap());
        assert_eq!(db.empty_collections().unwrap(), vec!["Recipes"]);
    }

    #[test]
    fn reflections_are_keyed_by_week() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.reflection("2026-10-11").unwrap(), None);
        db.save_reflection("2026-10-11", "first").unwrap();
        db.save_reflection("2026-10-11", "second").unwrap();
        db.save_reflection("2026-10-18", "other").unwrap();
        assert_eq!(db.reflection("2026-10-11").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");
        let path = path.to_str().unwrap();
        {
            let db = Database::new(path).unwrap();
            db.add_empty_collection("Ideas").unwrap();
        }
        let db = Database::new(path).unwrap();
        assert_eq!(db.empty_collections().unwrap(), vec!["Ideas"]);
    }
}

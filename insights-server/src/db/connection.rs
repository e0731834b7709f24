use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use super::schema::{DEMO_DATA, SCHEMA};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();

        // Every pooled handle to ":memory:" opens a distinct database, so the
        // in-memory pool is capped at a single shared connection.
        let pool = if path_str.trim().eq_ignore_ascii_case(MEMORY_DB_PATH) {
            Pool::builder()
                .max_size(1)
                .build(SqliteConnectionManager::memory())
        } else {
            Pool::new(SqliteConnectionManager::file(path))
        }
        .context("Failed to create database connection pool")?;

        Ok(Self { pool })
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Seed the database with demo data
    pub fn seed_demo_data(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(DEMO_DATA)
            .context("Failed to seed demo data")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        // Verify tables exist
        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"communities".to_string()));
        assert!(tables.contains(&"insights".to_string()));
        assert!(tables.contains(&"user_insights".to_string()));
        assert!(tables.contains(&"community_insights".to_string()));
    }

    #[test]
    fn test_seed_demo_data() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");

        let conn = db.connection().expect("Failed to get connection");
        let users: i32 = conn
            .query_row("SELECT COUNT(*) FROM users WHERE onboarded = 1", [], |row| {
                row.get(0)
            })
            .expect("Failed to count users");
        assert_eq!(users, 3);

        // Reply rows are never pushed into anyone's insights list
        let orphaned: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM user_insights ui
                 JOIN insights i ON i.id = ui.insight_id
                 WHERE i.parent_id IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .expect("Failed to count list rows");
        assert_eq!(orphaned, 0);
    }

    #[test]
    fn test_memory_database_detection() {
        // Test various memory database path formats
        let memory_paths = [":memory:", " :memory: ", ":MEMORY:", " :Memory: "];

        for path in &memory_paths {
            let db = Database::new(path).expect("Failed to create memory database");
            db.initialize().expect("Failed to initialize schema");
        }
    }

    #[test]
    fn test_text_length_constraint() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");

        let conn = db.connection().expect("Failed to get connection");
        let result = conn.execute(
            "INSERT INTO insights (id, author_id, text, created_at)
             VALUES ('x', '550e8400-e29b-41d4-a716-446655440001', 'ab', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err(), "Two-character text should violate the CHECK constraint");
    }
}

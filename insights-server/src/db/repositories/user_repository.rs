use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use insights_types::User;

use crate::db::DbPool;

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            username: row.get(1)?,
            name: row.get(2)?,
            image: row.get(3)?,
            bio: row.get(4)?,
            onboarded: row.get::<_, i32>(5)? == 1,
            joined_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
        })
    }

    /// Create or update a user record. The onboarding flow calls this once the
    /// profile form is complete, so the record is always marked onboarded.
    pub fn upsert(&self, user: &User) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, username, name, image, bio, onboarded, joined_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 name = excluded.name,
                 image = excluded.image,
                 bio = excluded.bio,
                 onboarded = excluded.onboarded",
            (
                user.id.to_string(),
                &user.username,
                &user.name,
                &user.image,
                &user.bio,
                if user.onboarded { 1 } else { 0 },
                user.joined_at.to_rfc3339(),
            ),
        )
        .context("Failed to upsert user")?;
        Ok(())
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, name, image, bio, onboarded, joined_at
             FROM users
             WHERE id = ?",
        )?;

        let user = stmt
            .query_row([user_id.to_string()], Self::map_row)
            .optional()?;

        Ok(user)
    }

    /// Get user by username
    #[allow(dead_code)]
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, name, image, bio, onboarded, joined_at
             FROM users
             WHERE username = ?",
        )?;

        let user = stmt.query_row([username], Self::map_row).optional()?;

        Ok(user)
    }

    /// Ids in the user's insights list, oldest first
    pub fn insight_ids(&self, user_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT ui.insight_id
             FROM user_insights ui
             JOIN insights i ON i.id = ui.insight_id
             WHERE ui.user_id = ?
             ORDER BY i.created_at ASC",
        )?;

        let ids = stmt
            .query_map([user_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        ids.into_iter()
            .map(|s| Uuid::parse_str(&s).context("Invalid insight id in user list"))
            .collect()
    }
}

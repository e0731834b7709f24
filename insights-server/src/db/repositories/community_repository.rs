use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use insights_types::Community;

use crate::db::DbPool;

pub struct CommunityRepository {
    pool: DbPool,
}

impl CommunityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row) -> rusqlite::Result<Community> {
        Ok(Community {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            slug: row.get(1)?,
            name: row.get(2)?,
            image: row.get(3)?,
            created_at: row.get::<_, String>(4)?.parse::<DateTime<Utc>>().unwrap(),
        })
    }

    pub fn create(&self, community: &Community) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO communities (id, slug, name, image, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                community.id.to_string(),
                &community.slug,
                &community.name,
                &community.image,
                community.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create community")?;
        Ok(())
    }

    /// Resolve a community by its external-facing slug
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Community>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, slug, name, image, created_at
             FROM communities
             WHERE slug = ?",
        )?;

        let community = stmt.query_row([slug], Self::map_row).optional()?;

        Ok(community)
    }

    #[allow(dead_code)]
    pub fn get_by_id(&self, community_id: &Uuid) -> Result<Option<Community>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, slug, name, image, created_at
             FROM communities
             WHERE id = ?",
        )?;

        let community = stmt
            .query_row([community_id.to_string()], Self::map_row)
            .optional()?;

        Ok(community)
    }

    /// Ids in the community's insights list, oldest first
    pub fn insight_ids(&self, community_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT ci.insight_id
             FROM community_insights ci
             JOIN insights i ON i.id = ci.insight_id
             WHERE ci.community_id = ?
             ORDER BY i.created_at ASC",
        )?;

        let ids = stmt
            .query_map([community_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        ids.into_iter()
            .map(|s| Uuid::parse_str(&s).context("Invalid insight id in community list"))
            .collect()
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use insights_types::{AuthorSummary, Community, CommunitySummary, FeedPage, Insight, InsightNode};

use crate::db::DbPool;

/// Columns for an insight populated with its author and community
const POPULATED_COLUMNS: &str = "i.id, i.text, i.parent_id, i.created_at,
       u.id, u.username, u.name, u.image,
       c.id, c.slug, c.name, c.image,
       (SELECT COUNT(*) FROM insights WHERE parent_id = i.id) AS reply_count";

/// Columns for a reply row; replies carry a restricted author projection only
const CHILD_COLUMNS: &str = "i.id, i.text, i.parent_id, i.created_at,
       u.id, u.username, u.name, u.image,
       (SELECT COUNT(*) FROM insights WHERE parent_id = i.id) AS reply_count";

/// Builds "?,?,?" for a dynamic IN list
fn placeholders(count: usize) -> String {
    let mut s = String::with_capacity(count * 2);
    for i in 0..count {
        if i > 0 {
            s.push(',');
        }
        s.push('?');
    }
    s
}

pub struct InsightRepository {
    pool: DbPool,
}

impl InsightRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_record(row: &Row) -> rusqlite::Result<Insight> {
        let community_id: Option<String> = row.get(2)?;
        let parent_id: Option<String> = row.get(3)?;
        Ok(Insight {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            author_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            community_id: community_id.and_then(|s| Uuid::parse_str(&s).ok()),
            parent_id: parent_id.and_then(|s| Uuid::parse_str(&s).ok()),
            text: row.get(4)?,
            created_at: row.get::<_, String>(5)?.parse::<DateTime<Utc>>().unwrap(),
        })
    }

    fn map_populated(row: &Row) -> rusqlite::Result<InsightNode> {
        let parent_id: Option<String> = row.get(2)?;
        let community = match row.get::<_, Option<String>>(8)? {
            Some(cid) => Some(CommunitySummary {
                id: Uuid::parse_str(&cid).unwrap(),
                slug: row.get(9)?,
                name: row.get(10)?,
                image: row.get(11)?,
            }),
            None => None,
        };
        Ok(InsightNode {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            text: row.get(1)?,
            author: AuthorSummary {
                id: Uuid::parse_str(&row.get::<_, String>(4)?).unwrap(),
                username: row.get(5)?,
                name: row.get(6)?,
                image: row.get(7)?,
            },
            community,
            parent_id: parent_id.and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
            reply_count: row.get(12)?,
            children: Vec::new(),
        })
    }

    fn map_child(row: &Row) -> rusqlite::Result<InsightNode> {
        let parent_id: Option<String> = row.get(2)?;
        Ok(InsightNode {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            text: row.get(1)?,
            author: AuthorSummary {
                id: Uuid::parse_str(&row.get::<_, String>(4)?).unwrap(),
                username: row.get(5)?,
                name: row.get(6)?,
                image: row.get(7)?,
            },
            community: None,
            parent_id: parent_id.and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
            reply_count: row.get(8)?,
            children: Vec::new(),
        })
    }

    /// Direct replies to an insight, oldest first
    fn children_of(conn: &Connection, parent_id: &Uuid) -> Result<Vec<InsightNode>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHILD_COLUMNS}
             FROM insights i
             JOIN users u ON i.author_id = u.id
             WHERE i.parent_id = ?
             ORDER BY i.created_at ASC"
        ))?;

        let children = stmt
            .query_map([parent_id.to_string()], Self::map_child)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(children)
    }

    /// Create a top-level insight and push its id into the author's insights
    /// list and, if the post belongs to a community, the community's list.
    /// All three writes commit atomically.
    pub fn create(&self, insight: &Insight, community: Option<&Community>) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction().context("Failed to create insight")?;

        tx.execute(
            "INSERT INTO insights (id, author_id, community_id, parent_id, text, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                insight.id.to_string(),
                insight.author_id.to_string(),
                insight.community_id.map(|id| id.to_string()),
                insight.parent_id.map(|id| id.to_string()),
                &insight.text,
                insight.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create insight")?;

        tx.execute(
            "INSERT INTO user_insights (user_id, insight_id) VALUES (?, ?)",
            (insight.author_id.to_string(), insight.id.to_string()),
        )
        .context("Failed to update author insight list")?;

        if let Some(community) = community {
            tx.execute(
                "INSERT INTO community_insights (community_id, insight_id) VALUES (?, ?)",
                (community.id.to_string(), insight.id.to_string()),
            )
            .context("Failed to update community insight list")?;
        }

        tx.commit().context("Failed to create insight")?;
        Ok(())
    }

    /// Create a comment. Comments are linked to their thread solely through
    /// `parent_id` and are not pushed into anyone's insights list.
    pub fn create_reply(&self, comment: &Insight) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO insights (id, author_id, community_id, parent_id, text, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.author_id.to_string(),
                comment.community_id.map(|id| id.to_string()),
                comment.parent_id.map(|id| id.to_string()),
                &comment.text,
                comment.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create comment")?;
        Ok(())
    }

    /// Get a single insight record by ID
    pub fn get_by_id(&self, insight_id: &Uuid) -> Result<Option<Insight>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, author_id, community_id, parent_id, text, created_at
             FROM insights
             WHERE id = ?",
        )?;

        let insight = stmt
            .query_row([insight_id.to_string()], Self::map_record)
            .optional()?;

        Ok(insight)
    }

    /// One page of the top-level feed, newest first, with one level of
    /// replies populated on each post
    pub fn fetch_page(&self, page: u32, page_size: u32) -> Result<FeedPage> {
        let conn = self.pool.get()?;
        let offset = (page.max(1) - 1) as i64 * page_size as i64;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POPULATED_COLUMNS}
             FROM insights i
             JOIN users u ON i.author_id = u.id
             LEFT JOIN communities c ON i.community_id = c.id
             WHERE i.parent_id IS NULL
             ORDER BY i.created_at DESC
             LIMIT ? OFFSET ?"
        ))?;

        let mut posts = stmt
            .query_map([page_size as i64, offset], Self::map_populated)?
            .collect::<Result<Vec<_>, _>>()?;

        for post in &mut posts {
            post.children = Self::children_of(&conn, &post.id)?;
        }

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM insights WHERE parent_id IS NULL",
            [],
            |row| row.get(0),
        )?;

        let is_next = total > offset + posts.len() as i64;

        Ok(FeedPage { posts, is_next })
    }

    /// An insight populated with author, community, and replies two levels
    /// deep (replies with their authors, and their replies with authors)
    pub fn get_thread(&self, insight_id: &Uuid) -> Result<Option<InsightNode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POPULATED_COLUMNS}
             FROM insights i
             JOIN users u ON i.author_id = u.id
             LEFT JOIN communities c ON i.community_id = c.id
             WHERE i.id = ?"
        ))?;

        let node = stmt
            .query_row([insight_id.to_string()], Self::map_populated)
            .optional()?;

        let Some(mut node) = node else {
            return Ok(None);
        };

        node.children = Self::children_of(&conn, &node.id)?;
        for child in &mut node.children {
            child.children = Self::children_of(&conn, &child.id)?;
        }

        Ok(Some(node))
    }

    /// Insights in a user's list, push order, one reply level populated
    pub fn get_by_author(&self, user_id: &Uuid) -> Result<Vec<InsightNode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POPULATED_COLUMNS}
             FROM insights i
             JOIN users u ON i.author_id = u.id
             LEFT JOIN communities c ON i.community_id = c.id
             JOIN user_insights ui ON ui.insight_id = i.id
             WHERE ui.user_id = ?
             ORDER BY i.created_at ASC"
        ))?;

        let mut insights = stmt
            .query_map([user_id.to_string()], Self::map_populated)?
            .collect::<Result<Vec<_>, _>>()?;

        for insight in &mut insights {
            insight.children = Self::children_of(&conn, &insight.id)?;
        }

        Ok(insights)
    }

    /// Insights in a community's list, push order, one reply level populated
    pub fn get_by_community(&self, community_id: &Uuid) -> Result<Vec<InsightNode>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POPULATED_COLUMNS}
             FROM insights i
             JOIN users u ON i.author_id = u.id
             LEFT JOIN communities c ON i.community_id = c.id
             JOIN community_insights ci ON ci.insight_id = i.id
             WHERE ci.community_id = ?
             ORDER BY i.created_at ASC"
        ))?;

        let mut insights = stmt
            .query_map([community_id.to_string()], Self::map_populated)?
            .collect::<Result<Vec<_>, _>>()?;

        for insight in &mut insights {
            insight.children = Self::children_of(&conn, &insight.id)?;
        }

        Ok(insights)
    }

    /// The insight plus every transitive descendant, depth-first.
    ///
    /// Walks the parent_id index with an explicit worklist so arbitrarily
    /// deep threads cannot exhaust the call stack.
    pub fn collect_thread_ids(&self, insight_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id FROM insights WHERE parent_id = ?")?;

        let mut collected = Vec::new();
        let mut pending = vec![*insight_id];

        while let Some(id) = pending.pop() {
            let children = stmt
                .query_map([id.to_string()], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            for child in children {
                pending.push(Uuid::parse_str(&child).context("Invalid insight id in thread")?);
            }

            collected.push(id);
        }

        Ok(collected)
    }

    /// Delete an insight and all of its descendants, and pull every deleted
    /// id out of the insights lists of each referencing user and community.
    /// The whole fix-up commits atomically. Returns the number of insight
    /// records removed.
    pub fn delete_thread(&self, insight_id: &Uuid) -> Result<usize> {
        let ids = self.collect_thread_ids(insight_id)?;
        let id_params: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let in_ids = placeholders(id_params.len());

        let mut conn = self.pool.get()?;

        // Distinct authors and communities referenced across the whole thread
        let authors: Vec<String> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT author_id FROM insights WHERE id IN ({in_ids})"
            ))?;
            let rows = stmt
                .query_map(params_from_iter(id_params.iter()), |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let communities: Vec<String> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT community_id FROM insights
                 WHERE community_id IS NOT NULL AND id IN ({in_ids})"
            ))?;
            let rows = stmt
                .query_map(params_from_iter(id_params.iter()), |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let tx = conn.transaction().context("Failed to delete insight")?;

        if !authors.is_empty() {
            tx.execute(
                &format!(
                    "DELETE FROM user_insights
                     WHERE user_id IN ({}) AND insight_id IN ({in_ids})",
                    placeholders(authors.len())
                ),
                params_from_iter(authors.iter().chain(id_params.iter())),
            )
            .context("Failed to update user insight lists")?;
        }

        if !communities.is_empty() {
            tx.execute(
                &format!(
                    "DELETE FROM community_insights
                     WHERE community_id IN ({}) AND insight_id IN ({in_ids})",
                    placeholders(communities.len())
                ),
                params_from_iter(communities.iter().chain(id_params.iter())),
            )
            .context("Failed to update community insight lists")?;
        }

        let deleted = tx
            .execute(
                &format!("DELETE FROM insights WHERE id IN ({in_ids})"),
                params_from_iter(id_params.iter()),
            )
            .context("Failed to delete insight")?;

        tx.commit().context("Failed to delete insight")?;

        Ok(deleted)
    }
}

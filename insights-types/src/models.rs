use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    /// Gates feed access in the presentation layer
    pub onboarded: bool,
    #[serde(with = "datetime_format")]
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    /// External-facing identifier used by callers (e.g. org handle)
    pub slug: String,
    pub name: String,
    pub image: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// A post or reply record. Top-level if `parent_id` is absent, otherwise a
/// comment in some other insight's thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Absent for personal posts
    #[serde(default)]
    pub community_id: Option<Uuid>,
    /// Parent insight ID for comments (None for top-level posts)
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub text: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Restricted author projection attached to populated insights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub image: Option<String>,
}

/// An insight populated with its author, community, and nested replies.
///
/// How deep `children` goes depends on the query that produced the node:
/// the feed populates one level, the detail view two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightNode {
    pub id: Uuid,
    pub text: String,
    pub author: AuthorSummary,
    #[serde(default)]
    pub community: Option<CommunitySummary>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    /// Total direct replies, including any not carried in `children`
    pub reply_count: i64,
    #[serde(default)]
    pub children: Vec<InsightNode>,
}

/// One page of the top-level feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<InsightNode>,
    pub is_next: bool,
}

/// Who a profile tab belongs to, tagged so consumers never have to
/// shape-switch on ad hoc fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsightOwner {
    User(AuthorSummary),
    Community(CommunitySummary),
}

/// A profile tab: the owning account plus its insights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedInsights {
    pub owner: InsightOwner,
    pub insights: Vec<InsightNode>,
}

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInsightRequest {
    pub text: String,
    pub author_id: Uuid,
    /// Community slug; omit for a personal post
    #[serde(default)]
    pub community_id: Option<String>,
    /// Route path whose cached rendering must be revalidated
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
    pub author_id: Uuid,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertUserRequest {
    pub user_id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommunityRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

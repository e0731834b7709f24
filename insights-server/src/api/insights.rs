use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::{CommunityRepository, InsightRepository, UserRepository},
    state::AppState,
    validation,
};
use insights_types::{AddCommentRequest, CreateInsightRequest, FeedPage, Insight, InsightNode};

#[derive(Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

#[derive(Deserialize)]
pub struct MutationQuery {
    /// Route path whose cached rendering must be revalidated
    path: String,
}

/// GET /insights - One page of the top-level feed, newest first
pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Json<FeedPage>> {
    let insight_repo = InsightRepository::new(state.db.pool.clone());

    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 100);

    let feed = insight_repo.fetch_page(page, page_size)?;

    Ok(Json(feed))
}

/// POST /insights - Create a top-level insight
pub async fn create_insight(
    State(state): State<AppState>,
    Json(payload): Json<CreateInsightRequest>,
) -> ApiResult<(StatusCode, Json<Insight>)> {
    validation::validate_insight_text(&payload.text)?;

    let pool = state.db.pool.clone();
    let insight_repo = InsightRepository::new(pool.clone());
    let community_repo = CommunityRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool);

    user_repo
        .get_by_id(&payload.author_id)?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    // Resolve the community by its external-facing slug; a missing or
    // unknown slug means a personal post
    let community = match payload.community_id.as_deref() {
        Some(slug) => community_repo.get_by_slug(slug)?,
        None => None,
    };

    let insight = Insight {
        id: Uuid::new_v4(),
        author_id: payload.author_id,
        community_id: community.as_ref().map(|c| c.id),
        parent_id: None,
        text: payload.text,
        created_at: Utc::now(),
    };

    insight_repo.create(&insight, community.as_ref())?;

    state.revalidator.invalidate(&payload.path);

    Ok((StatusCode::CREATED, Json(insight)))
}

/// GET /insights/:id - An insight with author, community, and replies two
/// levels deep
pub async fn get_insight(
    State(state): State<AppState>,
    Path(insight_id): Path<String>,
) -> ApiResult<Json<InsightNode>> {
    let insight_id = Uuid::parse_str(&insight_id)
        .map_err(|_| ApiError::BadRequest("Invalid insight ID".to_string()))?;

    let insight_repo = InsightRepository::new(state.db.pool.clone());

    let insight = insight_repo
        .get_thread(&insight_id)
        .map_err(|e| ApiError::InternalError(format!("Unable to fetch insight: {e:#}")))?
        .ok_or_else(|| ApiError::NotFound("Insight not found".to_string()))?;

    Ok(Json(insight))
}

/// POST /insights/:id/comments - Add a comment to an insight's thread
pub async fn add_comment(
    State(state): State<AppState>,
    Path(insight_id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<Insight>)> {
    let parent_id = Uuid::parse_str(&insight_id)
        .map_err(|_| ApiError::BadRequest("Invalid insight ID".to_string()))?;

    validation::validate_insight_text(&payload.text)?;

    let pool = state.db.pool.clone();
    let insight_repo = InsightRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool);

    // Find the original insight; nothing is written when it is gone
    let original = insight_repo
        .get_by_id(&parent_id)?
        .ok_or_else(|| ApiError::NotFound("Insight not found".to_string()))?;

    user_repo
        .get_by_id(&payload.author_id)?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let comment = Insight {
        id: Uuid::new_v4(),
        author_id: payload.author_id,
        community_id: None,
        parent_id: Some(original.id),
        text: payload.text,
        created_at: Utc::now(),
    };

    insight_repo.create_reply(&comment)?;

    state.revalidator.invalidate(&payload.path);

    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /insights/:id - Delete an insight and its whole reply tree
pub async fn delete_insight(
    State(state): State<AppState>,
    Path(insight_id): Path<String>,
    Query(query): Query<MutationQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let insight_id = Uuid::parse_str(&insight_id)
        .map_err(|_| ApiError::BadRequest("Invalid insight ID".to_string()))?;

    let insight_repo = InsightRepository::new(state.db.pool.clone());

    // A second delete of the same id lands here with no further writes
    insight_repo
        .get_by_id(&insight_id)?
        .ok_or_else(|| ApiError::NotFound("Insight not found".to_string()))?;

    let deleted = insight_repo.delete_thread(&insight_id)?;

    state.revalidator.invalidate(&query.path);

    Ok(Json(serde_json::json!({
        "success": true,
        "deleted": deleted,
        "insight_id": insight_id
    })))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::{CommunityRepository, InsightRepository},
    state::AppState,
};
use insights_types::{
    Community, CommunitySummary, CreateCommunityRequest, InsightOwner, OwnedInsights,
};

/// POST /communities
pub async fn create_community(
    State(state): State<AppState>,
    Json(payload): Json<CreateCommunityRequest>,
) -> ApiResult<(StatusCode, Json<Community>)> {
    let community_repo = CommunityRepository::new(state.db.pool.clone());

    if community_repo.get_by_slug(&payload.slug)?.is_some() {
        return Err(ApiError::BadRequest(
            "Community slug already taken".to_string(),
        ));
    }

    let community = Community {
        id: Uuid::new_v4(),
        slug: payload.slug,
        name: payload.name,
        image: payload.image,
        created_at: Utc::now(),
    };

    community_repo.create(&community)?;

    Ok((StatusCode::CREATED, Json(community)))
}

/// GET /communities/:slug/insights - The community's profile tab
pub async fn get_community_insights(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<OwnedInsights>> {
    let pool = state.db.pool.clone();
    let community_repo = CommunityRepository::new(pool.clone());
    let insight_repo = InsightRepository::new(pool);

    let community = community_repo
        .get_by_slug(&slug)?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))?;

    let insights = insight_repo.get_by_community(&community.id)?;

    Ok(Json(OwnedInsights {
        owner: InsightOwner::Community(CommunitySummary {
            id: community.id,
            slug: community.slug,
            name: community.name,
            image: community.image,
        }),
        insights,
    }))
}

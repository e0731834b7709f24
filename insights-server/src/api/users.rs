use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::{InsightRepository, UserRepository},
    state::AppState,
};
use insights_types::{AuthorSummary, InsightOwner, OwnedInsights, UpsertUserRequest, User};

/// POST /users - Create or update a profile; completes onboarding
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(payload): Json<UpsertUserRequest>,
) -> ApiResult<Json<User>> {
    let user_repo = UserRepository::new(state.db.pool.clone());

    // Keep the original join date on re-onboarding
    let existing = user_repo.get_by_id(&payload.user_id)?;

    let user = User {
        id: payload.user_id,
        username: payload.username,
        name: payload.name,
        image: payload.image,
        bio: payload.bio,
        onboarded: true,
        joined_at: existing.map(|u| u.joined_at).unwrap_or_else(Utc::now),
    };

    user_repo.upsert(&user)?;

    state.revalidator.invalidate(&payload.path);

    Ok(Json(user))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    let user_id =
        Uuid::parse_str(&user_id).map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))?;

    let user_repo = UserRepository::new(state.db.pool.clone());

    let user = user_repo
        .get_by_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// GET /users/:id/insights - The user's profile tab
pub async fn get_user_insights(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<OwnedInsights>> {
    let user_id =
        Uuid::parse_str(&user_id).map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))?;

    let pool = state.db.pool.clone();
    let user_repo = UserRepository::new(pool.clone());
    let insight_repo = InsightRepository::new(pool);

    let user = user_repo
        .get_by_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let insights = insight_repo.get_by_author(&user.id)?;

    Ok(Json(OwnedInsights {
        owner: InsightOwner::User(AuthorSummary {
            id: user.id,
            username: user.username,
            name: user.name,
            image: user.image,
        }),
        insights,
    }))
}

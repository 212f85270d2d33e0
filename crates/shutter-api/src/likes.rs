use axum::{
    Extension, Json,
    extract::State,
};
use tracing::debug;

use shutter_types::api::{Claims, LikeRequest, LikeResponse, LikeStatusQuery, LikeStatusResponse};

use crate::auth::{AppState, AppStateInner, authorize, provision_user_or_warn};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};

/// GET /api/status?userId=..&imageId=..
pub async fn like_status(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LikeStatusQuery>,
) -> Result<Json<LikeStatusResponse>, ApiError> {
    let is_liked = state.db.find_like(&query.user_id, query.image_id)?.is_some();
    Ok(Json(LikeStatusResponse { is_liked }))
}

/// POST /api/like. Sets the like to the requested state. Repeating a request is a no-op.
pub async fn set_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<LikeRequest>,
) -> Result<Json<LikeResponse>, ApiError> {
    authorize(&claims, &req.user_id)?;
    require_image(&state, req.image_id)?;
    provision_user_or_warn(&state, &req.user_id).await;

    let changed = state
        .db
        .set_like_state(&req.user_id, req.image_id, req.like)?;

    debug!(
        user_id = %req.user_id,
        image_id = req.image_id,
        liked = req.like,
        changed,
        "Like updated"
    );

    Ok(Json(LikeResponse {
        is_liked: req.like,
        changed,
    }))
}

pub(crate) fn require_image(state: &AppStateInner, image_id: i64) -> Result<(), ApiError> {
    if state.db.get_image_details(image_id)?.is_none() {
        return Err(ApiError::NotFound(format!("image {}", image_id)));
    }
    Ok(())
}

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use shutter_types::api::{CheckUserResponse, Claims, CreateUserResponse, ProfileResponse, UserIdRequest};
use shutter_types::models::Image;

use crate::auth::{AppState, authorize, provision_user};
use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

/// POST /api/checkUser
pub async fn check_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> Result<Json<CheckUserResponse>, ApiError> {
    let exists = state.db.user_exists(&req.user_id)?;
    Ok(Json(CheckUserResponse { exists }))
}

/// POST /api/createUser. 201 when a row was created, 200 when it already existed.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, &req.user_id)?;

    let created = provision_user(&state, &req.user_id).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(CreateUserResponse { created })))
}

/// GET /api/users/{user_id}
pub async fn get_profile(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .db
        .get_profile(&user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", user_id)))?;

    Ok(Json(ProfileResponse {
        user: convert::user(profile.user),
        post_count: profile.post_count,
        follower_count: profile.follower_count,
        following_count: profile.following_count,
        latest_image: profile.latest_image.map(convert::image),
    }))
}

/// GET /api/users/{user_id}/images
pub async fn get_user_images(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<Vec<Image>>, ApiError> {
    let images = state
        .db
        .get_user_images(&user_id)?
        .into_iter()
        .map(convert::image)
        .collect();

    Ok(Json(images))
}

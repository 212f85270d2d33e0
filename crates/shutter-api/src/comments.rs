use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use shutter_types::api::{Claims, CommentsQuery, PostCommentRequest, PostCommentResponse};
use shutter_types::models::Comment;

use crate::auth::{AppState, authorize, provision_user_or_warn};
use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::likes::require_image;

/// Maximum comment length in characters, after trimming.
const MAX_COMMENT_CHARS: usize = 2000;

/// POST /api/postComment
pub async fn post_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<PostCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, &req.user_id)?;

    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("comment is empty".into()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "comment exceeds {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    require_image(&state, req.image_id)?;
    provision_user_or_warn(&state, &req.user_id).await;

    let id = state.db.put_comment(&req.user_id, req.image_id, content)?;
    debug!(comment_id = id, image_id = req.image_id, "Comment posted");

    Ok((StatusCode::CREATED, Json(PostCommentResponse { id })))
}

/// GET /api/comments?imageId=..: newest first. An unknown image has no comments.
pub async fn get_comments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentsQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state
        .db
        .get_comments(query.image_id)?
        .into_iter()
        .map(convert::comment)
        .collect();

    Ok(Json(comments))
}

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use reqwest::Url;
use tracing::{debug, info};

use shutter_types::api::{
    CaptionRequest, Claims, ImageDetailsResponse, ImagePageQuery, ImagePageResponse,
    RegisterImageRequest,
};

use crate::auth::{AppState, authorize, provision_user};
use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

const MAX_PAGE_SIZE: u32 = 100;
const MAX_CAPTION_CHARS: usize = 2200;

/// GET /api/images?page=..&limit=..: global feed, newest first. `page` is 1-indexed.
pub async fn list_images(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ImagePageQuery>,
) -> Result<Json<ImagePageResponse>, ApiError> {
    if query.page == 0 {
        return Err(ApiError::BadRequest("page starts at 1".into()));
    }
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);

    let page = state.db.get_my_images(query.page, limit)?;

    Ok(Json(ImagePageResponse {
        images: page.images.into_iter().map(convert::image).collect(),
        total_count: page.total_count,
    }))
}

/// POST /api/images. Record a file the upload service has finished storing.
pub async fn register_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<RegisterImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, &req.user_id)?;

    match Url::parse(&req.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => return Err(ApiError::BadRequest(format!("invalid image url: {}", req.url))),
    }
    let description = match req.description.as_deref() {
        Some(raw) => normalize_caption(raw)?,
        None => None,
    };

    provision_user(&state, &req.user_id).await?;
    let owner = state
        .db
        .get_user_details(&req.user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", req.user_id)))?;

    let id = state.db.insert_image(
        &req.user_id,
        &req.url,
        description,
        &owner.full_name,
        &owner.profile_image_url,
    )?;
    info!(image_id = id, user_id = %req.user_id, "Image registered");

    let row = state
        .db
        .get_image_details(id)?
        .ok_or_else(|| ApiError::NotFound(format!("image {}", id)))?;

    Ok((StatusCode::CREATED, Json(convert::image(row))))
}

/// GET /api/images/{image_id}
pub async fn get_image(
    State(state): State<AppState>,
    ApiPath(image_id): ApiPath<i64>,
) -> Result<Json<ImageDetailsResponse>, ApiError> {
    let row = state
        .db
        .get_image_details(image_id)?
        .ok_or_else(|| ApiError::NotFound(format!("image {}", image_id)))?;
    let like_count = state.db.get_image_like_count(image_id)?;

    Ok(Json(ImageDetailsResponse {
        image: convert::image(row),
        like_count,
    }))
}

/// PUT /api/images/{image_id}/caption. Only the owner may caption an image;
/// a blank caption removes it.
pub async fn set_caption(
    State(state): State<AppState>,
    ApiPath(image_id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CaptionRequest>,
) -> Result<StatusCode, ApiError> {
    authorize(&claims, &req.user_id)?;
    let caption = normalize_caption(&req.caption)?;

    let image = state
        .db
        .get_image_details(image_id)?
        .ok_or_else(|| ApiError::NotFound(format!("image {}", image_id)))?;
    if image.user_id != req.user_id {
        return Err(ApiError::Forbidden(format!("image {} belongs to another user", image_id)));
    }

    if !state.db.set_caption(image_id, caption)? {
        return Err(ApiError::NotFound(format!("image {}", image_id)));
    }
    debug!(image_id, "Caption updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Trimmed caption, or `None` when blank. A blank caption clears the description.
fn normalize_caption(raw: &str) -> Result<Option<&str>, ApiError> {
    let caption = raw.trim();
    if caption.chars().count() > MAX_CAPTION_CHARS {
        return Err(ApiError::BadRequest(format!(
            "caption exceeds {} characters",
            MAX_CAPTION_CHARS
        )));
    }
    Ok(Some(caption).filter(|c| !c.is_empty()))
}

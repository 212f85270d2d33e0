use serde::{Deserialize, Serialize};

use crate::models::{Image, User};

// -- Session Claims --

/// Claims of a session token issued by the identity provider.
/// `sub` is the provider's user id, the same id used throughout the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserIdRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckUserResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub post_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
    pub latest_image: Option<Image>,
}

// -- Likes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatusQuery {
    pub user_id: String,
    pub image_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LikeRequest {
    pub user_id: String,
    pub image_id: i64,
    pub like: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatusResponse {
    pub is_liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub is_liked: bool,
    pub changed: bool,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostCommentRequest {
    pub user_id: String,
    pub image_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostCommentResponse {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub image_id: i64,
}

// -- Follows --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FollowRequest {
    pub follower_id: String,
    pub following_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusQuery {
    pub follower_id: String,
    pub following_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusResponse {
    pub is_following: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub is_following: bool,
    pub changed: bool,
}

// -- Images --

#[derive(Debug, Deserialize)]
pub struct ImagePageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePageResponse {
    pub images: Vec<Image>,
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterImageRequest {
    pub user_id: String,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetailsResponse {
    #[serde(flatten)]
    pub image: Image,
    pub like_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaptionRequest {
    pub user_id: String,
    pub caption: String,
}

pub mod auth;
pub mod comments;
pub mod convert;
pub mod error;
pub mod extract;
pub mod follows;
pub mod identity;
pub mod images;
pub mod likes;
pub mod middleware;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::auth::AppState;
use crate::middleware::require_session;

/// All HTTP routes. Reads are public; writes need a session token whose subject
/// is the user the request acts for.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/status", get(likes::like_status))
        .route("/api/checkUser", post(users::check_user))
        .route("/api/comments", get(comments::get_comments))
        .route("/api/followStatus", get(follows::follow_status))
        .route("/api/images", get(images::list_images))
        .route("/api/images/{image_id}", get(images::get_image))
        .route("/api/users/{user_id}", get(users::get_profile))
        .route("/api/users/{user_id}/images", get(users::get_user_images))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/createUser", post(users::create_user))
        .route("/api/like", post(likes::set_like))
        .route("/api/postComment", post(comments::post_comment))
        .route("/api/follow", post(follows::follow))
        .route("/api/unfollow", post(follows::unfollow))
        .route("/api/images", post(images::register_image))
        .route("/api/images/{image_id}/caption", put(images::set_caption))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

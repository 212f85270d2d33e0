use axum::{
    Extension, Json,
    extract::State,
};
use tracing::info;

use shutter_types::api::{Claims, FollowRequest, FollowResponse, FollowStatusQuery, FollowStatusResponse};

use crate::auth::{AppState, authorize, provision_user_or_warn};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};

/// POST /api/follow. Following someone you already follow is a no-op.
pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<FollowRequest>,
) -> Result<Json<FollowResponse>, ApiError> {
    authorize(&claims, &req.follower_id)?;
    if req.follower_id == req.following_id {
        return Err(ApiError::BadRequest("users cannot follow themselves".into()));
    }

    provision_user_or_warn(&state, &req.follower_id).await;
    let changed = state.db.follow_user(&req.follower_id, &req.following_id)?;

    if changed {
        info!(follower = %req.follower_id, following = %req.following_id, "Followed");
    }

    Ok(Json(FollowResponse {
        is_following: true,
        changed,
    }))
}

/// POST /api/unfollow
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<FollowRequest>,
) -> Result<Json<FollowResponse>, ApiError> {
    authorize(&claims, &req.follower_id)?;

    let changed = state.db.unfollow_user(&req.follower_id, &req.following_id)?;

    if changed {
        info!(follower = %req.follower_id, following = %req.following_id, "Unfollowed");
    }

    Ok(Json(FollowResponse {
        is_following: false,
        changed,
    }))
}

/// GET /api/followStatus?followerId=..&followingId=..
pub async fn follow_status(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FollowStatusQuery>,
) -> Result<Json<FollowStatusResponse>, ApiError> {
    let is_following = state
        .db
        .get_follow_status(&query.follower_id, &query.following_id)?;
    Ok(Json(FollowStatusResponse { is_following }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn follow_changes_follower_count_by_one() {
        let app = test_app(&[("u1", "Ada", "Lovelace")]);
        app.state.db.insert_user_if_absent("u2", "Grace Hopper", "/g.png").unwrap();
        let edge = json!({ "followerId": "u1", "followingId": "u2" });

        let (_, before) = app.get("/api/users/u2").await;
        let before = before["followerCount"].as_u64().unwrap();

        let (status, body) = app.post_as("u1", "/api/follow", edge.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "isFollowing": true, "changed": true }));

        let (_, body) = app.get("/api/followStatus?followerId=u1&followingId=u2").await;
        assert_eq!(body, json!({ "isFollowing": true }));
        let (_, profile) = app.get("/api/users/u2").await;
        assert_eq!(profile["followerCount"].as_u64().unwrap(), before + 1);

        // A second follow does not add another edge.
        let (_, body) = app.post_as("u1", "/api/follow", edge.clone()).await;
        assert_eq!(body["changed"], false);
        let (_, profile) = app.get("/api/users/u2").await;
        assert_eq!(profile["followerCount"].as_u64().unwrap(), before + 1);

        let (_, body) = app.post_as("u1", "/api/unfollow", edge).await;
        assert_eq!(body, json!({ "isFollowing": false, "changed": true }));

        let (_, body) = app.get("/api/followStatus?followerId=u1&followingId=u2").await;
        assert_eq!(body, json!({ "isFollowing": false }));
        let (_, profile) = app.get("/api/users/u2").await;
        assert_eq!(profile["followerCount"].as_u64().unwrap(), before);
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let app = test_app(&[("u1", "Ada", "Lovelace")]);
        let (status, _) = app
            .post_as("u1", "/api/follow", json!({ "followerId": "u1", "followingId": "u1" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unfollow_when_not_following() {
        let app = test_app(&[]);
        let (status, body) = app
            .post_as("u1", "/api/unfollow", json!({ "followerId": "u1", "followingId": "u2" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], false);
    }

    #[tokio::test]
    async fn cannot_follow_on_behalf_of_others() {
        let app = test_app(&[("u1", "Ada", "Lovelace")]);
        let (status, _) = app
            .post_as("u3", "/api/follow", json!({ "followerId": "u1", "followingId": "u2" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!app.state.db.get_follow_status("u1", "u2").unwrap());
    }

    #[tokio::test]
    async fn follow_survives_identity_lookup_failure() {
        let app = test_app(&[]);
        let (status, body) = app
            .post_as("u1", "/api/follow", json!({ "followerId": "u1", "followingId": "u2" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert!(app.state.db.get_follow_status("u1", "u2").unwrap());
    }
}

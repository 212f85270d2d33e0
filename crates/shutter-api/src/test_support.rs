//! Shared fixtures for handler tests: in-memory database, stub identity provider,
//! session tokens and a request helper driving the real router.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;

use shutter_db::Database;
use shutter_types::api::Claims;

use crate::auth::{AppState, AppStateInner};
use crate::identity::{IdentityError, IdentityProfile, IdentityProvider};

pub const SECRET: &str = "test-session-secret";

struct StubIdentity {
    profiles: HashMap<String, IdentityProfile>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn fetch_profile(&self, user_id: &str) -> Result<IdentityProfile, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or(IdentityError::UserNotFound)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub identity_calls: Arc<AtomicUsize>,
}

/// `profiles` are (user id, first name, last name) known to the stub provider.
pub fn test_app(profiles: &[(&str, &str, &str)]) -> TestApp {
    let calls = Arc::new(AtomicUsize::new(0));
    let identity = StubIdentity {
        profiles: profiles
            .iter()
            .map(|(id, first, last)| {
                (
                    id.to_string(),
                    IdentityProfile {
                        first_name: Some(first.to_string()),
                        last_name: Some(last.to_string()),
                        image_url: format!("https://img.example/{}.png", id),
                    },
                )
            })
            .collect(),
        calls: calls.clone(),
    };

    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        identity: Arc::new(identity),
        session_secret: SECRET.to_string(),
    });

    TestApp {
        router: crate::router(state.clone()),
        state,
        identity_calls: calls,
    }
}

pub fn token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

impl TestApp {
    pub fn seed_image(&self, owner: &str) -> i64 {
        self.state
            .db
            .insert_image(owner, "https://cdn.example/pic.jpg", None, "Owner", "/owner.png")
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(sub) = session {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(sub)));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post_as(&self, sub: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(sub), Some(body)).await
    }
}

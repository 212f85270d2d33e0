//! Identity provider profile lookups.
//!
//! Users are created lazily: the first time someone likes, comments, follows or
//! uploads, their display name and avatar are pulled from the identity provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user does not exist in the identity provider")]
    UserNotFound,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// Profile fields the provider returns for a user id.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: String,
}

impl IdentityProfile {
    /// First and last name joined by a space. Missing or blank parts are skipped.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<IdentityProfile, IdentityError>;
}

/// REST client for the provider's user API: `GET {base}/users/{id}` with a bearer key.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Identity provider URL cannot be a base: {}", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn user_url(&self, user_id: &str) -> Url {
        let mut url = self.base_url.clone();
        // Checked in new(): the base URL always has path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users").push(user_id);
        }
        url
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn fetch_profile(&self, user_id: &str) -> Result<IdentityProfile, IdentityError> {
        let url = self.user_url(user_id);
        debug!(%url, "Fetching identity profile");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityError::UserNotFound),
            status if !status.is_success() => Err(IdentityError::Status(status.as_u16())),
            _ => Ok(response.json().await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode as AxumStatus, header},
        routing::get,
    };
    use serde_json::json;

    fn profile(first: Option<&str>, last: Option<&str>) -> IdentityProfile {
        IdentityProfile {
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            image_url: String::new(),
        }
    }

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(profile(Some("Ada"), Some("Lovelace")).full_name(), "Ada Lovelace");
        assert_eq!(profile(Some("Ada"), None).full_name(), "Ada");
        assert_eq!(profile(Some("Ada"), Some("  ")).full_name(), "Ada");
        assert_eq!(profile(None, Some("Lovelace")).full_name(), "Lovelace");
        assert_eq!(profile(None, None).full_name(), "");
    }

    #[test]
    fn user_url_appends_segments() {
        let provider = HttpIdentityProvider::new("https://idp.example/v1/", "key").unwrap();
        assert_eq!(provider.user_url("user_42").as_str(), "https://idp.example/v1/users/user_42");

        let provider = HttpIdentityProvider::new("https://idp.example/v1", "key").unwrap();
        assert_eq!(
            provider.user_url("a/b").as_str(),
            "https://idp.example/v1/users/a%2Fb"
        );
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(HttpIdentityProvider::new("mailto:someone@example.com", "key").is_err());
    }

    async fn serve_fake_provider() -> String {
        async fn user(
            Path(id): Path<String>,
            headers: HeaderMap,
        ) -> Result<Json<serde_json::Value>, AxumStatus> {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if auth != Some("Bearer sk_test") {
                return Err(AxumStatus::UNAUTHORIZED);
            }
            match id.as_str() {
                "user_1" => Ok(Json(json!({
                    "first_name": "Ada",
                    "last_name": null,
                    "image_url": "https://img.example/ada.png",
                }))),
                _ => Err(AxumStatus::NOT_FOUND),
            }
        }

        let app = Router::new().route("/v1/users/{id}", get(user));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn fetches_profile_over_http() {
        let base = serve_fake_provider().await;
        let provider = HttpIdentityProvider::new(&base, "sk_test").unwrap();

        let profile = provider.fetch_profile("user_1").await.unwrap();
        assert_eq!(profile.full_name(), "Ada");
        assert_eq!(profile.image_url, "https://img.example/ada.png");

        let missing = provider.fetch_profile("user_2").await;
        assert!(matches!(missing, Err(IdentityError::UserNotFound)));
    }

    #[tokio::test]
    async fn bad_key_surfaces_status() {
        let base = serve_fake_provider().await;
        let provider = HttpIdentityProvider::new(&base, "wrong").unwrap();

        let result = provider.fetch_profile("user_1").await;
        assert!(matches!(result, Err(IdentityError::Status(401))));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as shown next to their posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub full_name: String,
    pub profile_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: i64,
    pub user_id: String,
    pub url: String,
    pub description: Option<String>,
    pub uploaded_by: String,
    pub profile_image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub user_id: String,
    pub image_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub profile_image_url: String,
}

//! Database row types: these map directly to SQLite rows.
//! Distinct from shutter-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user_id: String,
    pub full_name: String,
    pub profile_image_url: String,
}

#[derive(Debug, Clone)]
pub struct ImageRow {
    pub id: i64,
    pub user_id: String,
    pub url: String,
    pub description: Option<String>,
    pub uploaded_by: String,
    pub profile_image_url: String,
    pub created_at: String,
}

/// One page of the global feed plus the size of the whole feed.
#[derive(Debug)]
pub struct ImagePage {
    pub images: Vec<ImageRow>,
    pub total_count: u64,
}

#[derive(Debug, Clone)]
pub struct LikeRow {
    pub user_id: String,
    pub image_id: i64,
    pub created_at: String,
}

/// A comment joined with its author's display details.
#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub user_id: String,
    pub image_id: i64,
    pub content: String,
    pub created_at: String,
    pub full_name: String,
    pub profile_image_url: String,
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub user: UserRow,
    pub post_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
    pub latest_image: Option<ImageRow>,
}

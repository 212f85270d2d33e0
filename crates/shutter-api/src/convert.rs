//! Row to wire conversions.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use shutter_db::models::{CommentRow, ImageRow, UserRow};
use shutter_types::models::{Comment, Image, User};

pub fn user(row: UserRow) -> User {
    User {
        user_id: row.user_id,
        full_name: row.full_name,
        profile_image_url: row.profile_image_url,
    }
}

pub fn image(row: ImageRow) -> Image {
    Image {
        created_at: parse_timestamp(&row.created_at, "image", row.id),
        id: row.id,
        user_id: row.user_id,
        url: row.url,
        description: row.description,
        uploaded_by: row.uploaded_by,
        profile_image_url: row.profile_image_url,
    }
}

pub fn comment(row: CommentRow) -> Comment {
    Comment {
        created_at: parse_timestamp(&row.created_at, "comment", row.id),
        id: row.id,
        user_id: row.user_id,
        image_id: row.image_id,
        content: row.content,
        full_name: row.full_name,
        profile_image_url: row.profile_image_url,
    }
}

fn parse_timestamp(raw: &str, kind: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand may use SQLite's "YYYY-MM-DD HH:MM:SS" without timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, kind, id, e);
            DateTime::default()
        })
}

use crate::Database;
use crate::models::{CommentRow, ImagePage, ImageRow, LikeRow, ProfileRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Params, Row};

const IMAGE_COLUMNS: &str =
    "id, user_id, url, description, uploaded_by, profile_image_url, created_at";

const UNKNOWN_AUTHOR: &str = "Unknown";
const DEFAULT_PROFILE_IMAGE: &str = "/default-profile.png";

impl Database {
    // -- Users --

    pub fn get_user_details(&self, user_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, user_id))
    }

    pub fn user_exists(&self, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = count(conn, "SELECT COUNT(*) FROM users WHERE user_id = ?1", [user_id])?;
            Ok(n > 0)
        })
    }

    /// Insert a user unless one with the same id already exists.
    /// Returns true iff a new row was created.
    pub fn insert_user_if_absent(
        &self,
        user_id: &str,
        full_name: &str,
        profile_image_url: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (user_id, full_name, profile_image_url) VALUES (?1, ?2, ?3)",
                (user_id, full_name, profile_image_url),
            )?;
            Ok(inserted == 1)
        })
    }

    // -- Images --

    /// Record an image the upload service has already stored. Returns the new image id.
    pub fn insert_image(
        &self,
        user_id: &str,
        url: &str,
        description: Option<&str>,
        uploaded_by: &str,
        profile_image_url: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO images (user_id, url, description, uploaded_by, profile_image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (user_id, url, description, uploaded_by, profile_image_url),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// One page of the global feed, newest id first. `page` is 1-indexed.
    pub fn get_my_images(&self, page: u32, limit: u32) -> Result<ImagePage> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

        self.with_conn(|conn| {
            let images = query_images(
                conn,
                &format!("SELECT {IMAGE_COLUMNS} FROM images ORDER BY id DESC LIMIT ?1 OFFSET ?2"),
                (i64::from(limit), offset),
            )?;
            let total_count = count(conn, "SELECT COUNT(*) FROM images", [])?;

            Ok(ImagePage {
                images,
                total_count,
            })
        })
    }

    pub fn get_user_images(&self, user_id: &str) -> Result<Vec<ImageRow>> {
        self.with_conn(|conn| {
            query_images(
                conn,
                &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE user_id = ?1 ORDER BY id"),
                [user_id],
            )
        })
    }

    pub fn get_image_count(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| query_image_count(conn, user_id))
    }

    pub fn get_image_details(&self, image_id: i64) -> Result<Option<ImageRow>> {
        self.with_conn(|conn| {
            let mut rows = query_images(
                conn,
                &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
                [image_id],
            )?;
            Ok(rows.pop())
        })
    }

    pub fn get_latest_image(&self, user_id: &str) -> Result<Option<ImageRow>> {
        self.with_conn(|conn| query_latest_image(conn, user_id))
    }

    /// Set or clear an image's caption. Returns false if the image does not exist.
    pub fn set_caption(&self, image_id: i64, caption: Option<&str>) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE images SET description = ?1 WHERE id = ?2",
                (caption, image_id),
            )?;
            Ok(updated > 0)
        })
    }

    pub fn get_caption(&self, image_id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let caption: Option<Option<String>> = conn
                .query_row("SELECT description FROM images WHERE id = ?1", [image_id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(caption.flatten())
        })
    }

    pub fn get_image_like_count(&self, image_id: i64) -> Result<u64> {
        self.with_conn(|conn| {
            count(conn, "SELECT COUNT(*) FROM likes WHERE image_id = ?1", [image_id])
        })
    }

    // -- Likes --

    pub fn find_like(&self, user_id: &str, image_id: i64) -> Result<Option<LikeRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, image_id, created_at FROM likes WHERE user_id = ?1 AND image_id = ?2",
                (user_id, image_id),
                |row| {
                    Ok(LikeRow {
                        user_id: row.get(0)?,
                        image_id: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Bring the like for (user, image) into the requested state.
    /// Returns true if the stored state changed, false if it already matched.
    pub fn set_like_state(&self, user_id: &str, image_id: i64, liked: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = if liked {
                conn.execute(
                    "INSERT OR IGNORE INTO likes (user_id, image_id) VALUES (?1, ?2)",
                    (user_id, image_id),
                )?
            } else {
                conn.execute(
                    "DELETE FROM likes WHERE user_id = ?1 AND image_id = ?2",
                    (user_id, image_id),
                )?
            };
            Ok(changed > 0)
        })
    }

    // -- Comments --

    pub fn put_comment(&self, user_id: &str, image_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (user_id, image_id, content) VALUES (?1, ?2, ?3)",
                (user_id, image_id, content),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Comments on an image, newest first, with author details resolved in the same query.
    pub fn get_comments(&self, image_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.user_id, c.image_id, c.content, c.created_at,
                        u.full_name, u.profile_image_url
                 FROM comments c
                 LEFT JOIN users u ON c.user_id = u.user_id
                 WHERE c.image_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC",
            )?;

            let rows = stmt
                .query_map([image_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        image_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                        full_name: row
                            .get::<_, Option<String>>(5)?
                            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                        profile_image_url: row
                            .get::<_, Option<String>>(6)?
                            .unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string()),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Follows --

    /// Returns true if a new follow edge was created. Repeats and self-follows are no-ops.
    pub fn follow_user(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO user_relationships (follower_id, following_id) VALUES (?1, ?2)",
                (follower_id, following_id),
            )?;
            Ok(inserted > 0)
        })
    }

    /// Returns true if an existing follow edge was removed.
    pub fn unfollow_user(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM user_relationships WHERE follower_id = ?1 AND following_id = ?2",
                (follower_id, following_id),
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn get_follow_status(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = count(
                conn,
                "SELECT COUNT(*) FROM user_relationships WHERE follower_id = ?1 AND following_id = ?2",
                (follower_id, following_id),
            )?;
            Ok(n > 0)
        })
    }

    pub fn get_follower_count(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| query_follower_count(conn, user_id))
    }

    pub fn get_following_count(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| query_following_count(conn, user_id))
    }

    // -- Profile --

    /// User details plus aggregate counts, read under a single lock.
    pub fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let Some(user) = query_user(conn, user_id)? else {
                return Ok(None);
            };

            Ok(Some(ProfileRow {
                user,
                post_count: query_image_count(conn, user_id)?,
                follower_count: query_follower_count(conn, user_id)?,
                following_count: query_following_count(conn, user_id)?,
                latest_image: query_latest_image(conn, user_id)?,
            }))
        })
    }
}

fn query_user(conn: &Connection, user_id: &str) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT user_id, full_name, profile_image_url FROM users WHERE user_id = ?1",
        [user_id],
        |row| {
            Ok(UserRow {
                user_id: row.get(0)?,
                full_name: row.get(1)?,
                profile_image_url: row.get(2)?,
            })
        },
    )
    .optional()
}

fn query_images<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<ImageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, image_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_latest_image(conn: &Connection, user_id: &str) -> Result<Option<ImageRow>> {
    conn.query_row(
        &format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ),
        [user_id],
        image_from_row,
    )
    .optional()
}

fn query_image_count(conn: &Connection, user_id: &str) -> Result<u64> {
    count(conn, "SELECT COUNT(*) FROM images WHERE user_id = ?1", [user_id])
}

fn query_follower_count(conn: &Connection, user_id: &str) -> Result<u64> {
    count(conn, "SELECT COUNT(*) FROM user_relationships WHERE following_id = ?1", [user_id])
}

fn query_following_count(conn: &Connection, user_id: &str) -> Result<u64> {
    count(conn, "SELECT COUNT(*) FROM user_relationships WHERE follower_id = ?1", [user_id])
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        url: row.get(2)?,
        description: row.get(3)?,
        uploaded_by: row.get(4)?,
        profile_image_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn count<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(u64::try_from(n)?)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

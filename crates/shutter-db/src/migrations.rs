use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Current UTC time with millisecond precision, RFC 3339.
const NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(&format!(
            "
            CREATE TABLE users (
                user_id             TEXT PRIMARY KEY,
                full_name           TEXT NOT NULL,
                profile_image_url   TEXT NOT NULL,
                created_at          TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE TABLE images (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id             TEXT NOT NULL,
                url                 TEXT NOT NULL,
                description         TEXT,
                uploaded_by         TEXT NOT NULL,
                profile_image_url   TEXT NOT NULL,
                created_at          TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE INDEX idx_images_user ON images(user_id);

            CREATE TABLE likes (
                user_id     TEXT NOT NULL,
                image_id    INTEGER NOT NULL REFERENCES images(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT {NOW},
                PRIMARY KEY (user_id, image_id)
            );

            CREATE INDEX idx_likes_image ON likes(image_id);

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL,
                image_id    INTEGER NOT NULL REFERENCES images(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT {NOW}
            );

            CREATE INDEX idx_comments_image ON comments(image_id, created_at);

            CREATE TABLE user_relationships (
                follower_id     TEXT NOT NULL,
                following_id    TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT {NOW},
                PRIMARY KEY (follower_id, following_id),
                CHECK (follower_id <> following_id)
            );

            CREATE INDEX idx_relationships_following ON user_relationships(following_id);

            INSERT INTO schema_version (version) VALUES (1);
            "
        ))?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn timestamps_default_to_rfc3339() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (user_id, full_name, profile_image_url) VALUES ('u1', 'A', '')",
            [],
        )
        .unwrap();

        let created_at: String = conn
            .query_row("SELECT created_at FROM users WHERE user_id = 'u1'", [], |r| r.get(0))
            .unwrap();
        assert!(created_at.contains('T'));
        assert!(created_at.ends_with('Z'));
    }
}

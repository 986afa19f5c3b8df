use sqlx::SqlitePool;

/// Creates the schema on startup. All chats share one `messages` table
/// keyed by the pairwise channel id; the friend list is served by the
/// participant indexes instead of a full scan.
pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            student_id    TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            major         TEXT NOT NULL DEFAULT '',
            photo_url     TEXT NOT NULL DEFAULT '',
            uid           TEXT NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS requests (
            id         TEXT PRIMARY KEY,
            from_id    TEXT NOT NULL,
            from_name  TEXT NOT NULL,
            to_id      TEXT NOT NULL,
            status     TEXT NOT NULL DEFAULT 'pending',
            created_at INTEGER NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_requests_from ON requests (from_id, status)")
        .execute(db_pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_requests_to ON requests (to_id, status)")
        .execute(db_pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS messages (
            id         TEXT PRIMARY KEY,
            channel_id TEXT NOT NULL,
            sender_id  TEXT NOT NULL,
            text       TEXT NOT NULL DEFAULT '',
            media_url  TEXT,
            media_kind TEXT,
            read       INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages (channel_id, created_at)")
        .execute(db_pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS statuses (
            id          TEXT PRIMARY KEY,
            author_id   TEXT NOT NULL,
            author_name TEXT NOT NULL,
            photo_url   TEXT NOT NULL DEFAULT '',
            text        TEXT NOT NULL DEFAULT '',
            media_url   TEXT,
            media_kind  TEXT,
            created_at  INTEGER NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_statuses_time ON statuses (created_at)")
        .execute(db_pool)
        .await?;

    Ok(())
}

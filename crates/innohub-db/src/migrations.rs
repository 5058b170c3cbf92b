use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            password      TEXT NOT NULL,
            display_name  TEXT NOT NULL,
            domain        TEXT,
            bio           TEXT,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS ideas (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            domain          TEXT NOT NULL,
            problem         TEXT NOT NULL,
            solution        TEXT NOT NULL,
            stage           TEXT NOT NULL,
            funding_amount  REAL NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_ideas_user
            ON ideas(user_id, created_at);

        -- Deleting an idea removes its message thread with it.
        CREATE TABLE IF NOT EXISTS messages (
            id           TEXT PRIMARY KEY,
            sender_id    TEXT NOT NULL REFERENCES users(id),
            receiver_id  TEXT NOT NULL REFERENCES users(id),
            idea_id      TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
            body         TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_idea
            ON messages(idea_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

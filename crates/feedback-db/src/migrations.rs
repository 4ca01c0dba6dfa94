use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, feedback)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                username    TEXT PRIMARY KEY NOT NULL,
                password    TEXT NOT NULL,
                email       VARCHAR(50) NOT NULL UNIQUE,
                first_name  VARCHAR(30) NOT NULL,
                last_name   VARCHAR(30) NOT NULL
            );

            CREATE TABLE feedback (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       VARCHAR(50) NOT NULL,
                content     TEXT NOT NULL,
                username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE
            );

            CREATE INDEX idx_feedback_username ON feedback(username);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

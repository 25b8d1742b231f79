use anyhow::Result;
use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

/// Open (or create) the sqlite database in the directory `db_path`.
pub async fn async_db(db_path: &str) -> Result<Connection> {
    std::fs::create_dir_all(db_path)?;
    let db = Connection::open(format!("{}/db.sqlite", db_path)).await?;
    Ok(db)
}

pub fn initialize_db(conn: &SyncConnection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "BEGIN;
         -- Mailbox refresh tokens keyed by account email
         CREATE TABLE IF NOT EXISTS auth (
             id TEXT PRIMARY KEY,
             service TEXT NOT NULL,
             refresh_token TEXT NOT NULL
         );
         -- Clio access tokens keyed by user id
         CREATE TABLE IF NOT EXISTS clio_session (
             user_id TEXT PRIMARY KEY,
             access_token TEXT NOT NULL,
             refresh_token TEXT,
             expires_at TEXT
         );
         COMMIT;",
    )
}

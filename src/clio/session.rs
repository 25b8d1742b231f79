//! Storage for Clio access tokens, keyed by user id.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::Connection;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<AuthToken>>;
    /// Store a token for `user_id`, replacing any previous one.
    async fn put(&self, user_id: &str, token: AuthToken) -> Result<()>;
}

pub type SharedSessionStore = Arc<dyn SessionStore>;

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    inner: Arc<RwLock<HashMap<String, AuthToken>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Option<AuthToken>> {
        let sessions = self
            .inner
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock on sessions: {:?}", e))?;
        Ok(sessions.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, token: AuthToken) -> Result<()> {
        let mut sessions = self
            .inner
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock on sessions: {:?}", e))?;
        sessions.insert(user_id.to_string(), token);
        Ok(())
    }
}

/// Sessions persisted in the `clio_session` table so they survive a
/// restart.
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Connection,
}

impl SqliteSessionStore {
    pub fn new(db: Connection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, user_id: &str) -> Result<Option<AuthToken>> {
        let user_id = user_id.to_string();
        let row = self
            .db
            .call(move |conn| {
                let row: Option<(String, Option<String>, Option<String>)> = conn
                    .query_row(
                        "SELECT access_token, refresh_token, expires_at FROM clio_session WHERE user_id = ?1",
                        [&user_id],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        let Some((access_token, refresh_token, expires_at)) = row else {
            return Ok(None);
        };
        let expires_at = expires_at
            .map(|ts| DateTime::parse_from_rfc3339(&ts).map(|dt| dt.with_timezone(&Utc)))
            .transpose()?;

        Ok(Some(AuthToken {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    async fn put(&self, user_id: &str, token: AuthToken) -> Result<()> {
        let user_id = user_id.to_string();
        let expires_at = token.expires_at.map(|dt| dt.to_rfc3339());
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO clio_session (user_id, access_token, refresh_token, expires_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(user_id) DO UPDATE SET access_token = excluded.access_token, refresh_token = excluded.refresh_token, expires_at = excluded.expires_at",
                    (&user_id, &token.access_token, &token.refresh_token, &expires_at),
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

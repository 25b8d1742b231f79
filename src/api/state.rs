use std::sync::{Arc, RwLock};

use anyhow::Result;
use reqwest::Client;
use tokio_rusqlite::Connection;

use crate::clio::{ClioClient, SharedSessionStore, SqliteSessionStore};
use crate::core::{AppConfig, http::http_client};
use crate::summarize::Summarizer;

pub type SharedState = Arc<RwLock<AppState>>;

pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    pub http: Client,
    pub clio: ClioClient,
    pub summarizer: Summarizer,
}

impl AppState {
    /// Clio sessions are kept in the same sqlite database as the
    /// mailbox refresh tokens.
    pub fn new(db: Connection, config: AppConfig) -> Result<Self> {
        let sessions = Arc::new(SqliteSessionStore::new(db.clone()));
        Self::with_sessions(db, config, sessions)
    }

    pub fn with_sessions(
        db: Connection,
        config: AppConfig,
        sessions: SharedSessionStore,
    ) -> Result<Self> {
        let http = http_client()?;
        let clio = ClioClient::from_config(http.clone(), &config, sessions);
        let summarizer = Summarizer::from_config(http.clone(), &config);
        Ok(Self {
            db,
            config,
            http,
            clio,
            summarizer,
        })
    }
}

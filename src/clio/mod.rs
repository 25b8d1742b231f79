//! Clio client: OAuth authorization code flow plus activity creation.

pub mod activity;
pub mod session;

pub use activity::{ActivityResult, ActivityStatus, build_activity_payload};
pub use session::{
    AuthToken, InMemorySessionStore, SessionStore, SharedSessionStore, SqliteSessionStore,
};

use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::core::{AppConfig, BatchReport};
use crate::summarize::BillingEntry;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User {0} not authenticated with Clio")]
    NotAuthenticated(String),
    #[error("Failed to exchange code for token: {0}")]
    Exchange(String),
    #[error("Session store error: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

// Out of range lifetimes are stored as unknown
fn expiry_from_now(secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|d| Utc::now().checked_add_signed(d))
}

#[derive(Clone)]
pub struct ClioClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    sessions: SharedSessionStore,
}

impl ClioClient {
    pub fn new(
        client: Client,
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        sessions: SharedSessionStore,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            sessions,
        }
    }

    pub fn from_config(client: Client, config: &AppConfig, sessions: SharedSessionStore) -> Self {
        Self::new(
            client,
            &config.clio_base_url,
            &config.clio_client_id,
            &config.clio_client_secret,
            &config.clio_redirect_uri,
            sessions,
        )
    }

    /// Where to send the user to grant access. `state` comes back
    /// untouched on the callback and is used to carry the user id.
    pub fn authorization_url(&self, state: Option<&str>) -> String {
        let mut url = format!(
            "{}/oauth/authorize?response_type=code&client_id={}&redirect_uri={}&scope=all",
            self.base_url, self.client_id, self.redirect_uri
        );
        if let Some(state) = state {
            url.push_str(&format!("&state={}", urlencoding::encode(state)));
        }
        url
    }

    /// Trade an authorization code for a token and store it for
    /// `user_id`, replacing whatever was there.
    pub async fn exchange_code(&self, user_id: &str, code: &str) -> Result<AuthToken, AuthError> {
        let token_url = format!("{}/oauth/token", self.base_url);
        let res = self
            .client
            .post(&token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Token exchange failed: {}", e);
                AuthError::Exchange(e.to_string())
            })?;

        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!("Token exchange failed: {} ({})", status, text);
            return Err(AuthError::Exchange(format!("{} ({})", status, text)));
        }
        let resp: TokenResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::Exchange(e.to_string()))?;

        let token = AuthToken {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            expires_at: resp.expires_in.and_then(expiry_from_now),
        };
        self.sessions.put(user_id, token.clone()).await?;
        tracing::info!("Stored Clio token for {}", user_id);

        Ok(token)
    }

    pub async fn token(&self, user_id: &str) -> Result<Option<AuthToken>, AuthError> {
        Ok(self.sessions.get(user_id).await?)
    }

    async fn create_activity(&self, access_token: &str, payload: &Value) -> Result<Value, String> {
        let url = format!("{}/api/v4/activities", self.base_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| format!("Error creating activity: {}", e))?;

        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(format!("HTTP {}: {}", status.as_u16(), text));
        }

        Ok(serde_json::from_str(&text)
            .unwrap_or_else(|_| json!({"status": "created", "code": status.as_u16()})))
    }

    /// Create one activity per entry for `user_id`, dated today. Entries
    /// are sent one at a time and a failure only affects that entry.
    pub async fn submit_entries(
        &self,
        user_id: &str,
        entries: &[BillingEntry],
    ) -> Result<ActivityResult, AuthError> {
        let today = Local::now().date_naive();
        self.submit_entries_on(user_id, entries, today).await
    }

    pub async fn submit_entries_on(
        &self,
        user_id: &str,
        entries: &[BillingEntry],
        date: NaiveDate,
    ) -> Result<ActivityResult, AuthError> {
        let token = self
            .token(user_id)
            .await?
            .ok_or_else(|| AuthError::NotAuthenticated(user_id.to_string()))?;

        let mut report = BatchReport::new();
        for (idx, entry) in entries.iter().enumerate() {
            let payload = build_activity_payload(entry, date);
            tracing::debug!("Creating activity: {}", payload);
            match self.create_activity(&token.access_token, &payload).await {
                Ok(created) => report.completed(created),
                Err(e) => {
                    tracing::error!("{}", e);
                    report.failed(format!("entry {}", idx + 1), e);
                }
            }
        }

        Ok(ActivityResult::from(report))
    }
}

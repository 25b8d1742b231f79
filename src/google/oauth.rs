//! Google OAuth for mailbox access. Only the refresh token is stored,
//! an access token is minted from it whenever one is needed.

use anyhow::{Result, anyhow};
use reqwest::Client;
use rusqlite::OptionalExtension;
use serde::Deserialize;
use tokio_rusqlite::Connection;

use crate::core::AppConfig;

pub const GMAIL_SERVICE: &str = "gmail";
pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

#[derive(Debug, Deserialize)]
pub struct GoogleToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

async fn token_request(
    client: &Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<GoogleToken> {
    let res = client.post(token_url).form(form).send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Google token request failed: {} ({})", status, text);
    }
    let token: GoogleToken = serde_json::from_str(&text)?;
    Ok(token)
}

/// URL the user visits to grant read access to their mailbox.
pub fn authorization_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(GMAIL_SCOPE)
    )
}

pub async fn exchange_code_for_token(
    client: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<GoogleToken> {
    token_request(
        client,
        token_url,
        &[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ],
    )
    .await
}

pub async fn refresh_access_token(
    client: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<GoogleToken> {
    token_request(
        client,
        token_url,
        &[
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
        ],
    )
    .await
}

pub async fn save_refresh_token(db: &Connection, email: &str, refresh_token: &str) -> Result<()> {
    let email = email.to_string();
    let refresh_token = refresh_token.to_string();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO auth (id, service, refresh_token) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET service = excluded.service, refresh_token = excluded.refresh_token",
            (&email, GMAIL_SERVICE, &refresh_token),
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn find_refresh_token(db: &Connection, email: &str) -> Result<Option<String>> {
    let email = email.to_string();
    let token = db
        .call(move |conn| {
            let token: Option<String> = conn
                .query_row(
                    "SELECT refresh_token FROM auth WHERE id = ?1 AND service = ?2",
                    (&email, GMAIL_SERVICE),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(token)
        })
        .await?;
    Ok(token)
}

/// Mint a fresh Gmail access token for `email` from its stored
/// refresh token.
pub async fn access_token_for(
    client: &Client,
    config: &AppConfig,
    db: &Connection,
    email: &str,
) -> Result<String> {
    let refresh_token = find_refresh_token(db, email)
        .await?
        .ok_or_else(|| anyhow!("No Gmail refresh token stored for {}", email))?;
    let token = refresh_access_token(
        client,
        &config.google_oauth_token_url,
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &refresh_token,
    )
    .await?;
    Ok(token.access_token)
}

use std::env;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    // Account used when a request doesn't name one
    pub default_user: String,
    pub max_emails: u32,
    pub gmail_api_base_url: String,
    pub google_oauth_token_url: String,
    pub gmail_api_client_id: String,
    pub gmail_api_client_secret: String,
    pub gmail_redirect_uri: String,
    pub openai_api_hostname: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub default_matter_id: i64,
    pub clio_base_url: String,
    pub clio_client_id: String,
    pub clio_client_secret: String,
    pub clio_redirect_uri: String,
}

// Loopback redirect for installed apps. Nothing needs to listen on it,
// the code is read off the browser's address bar.
pub const DEFAULT_GMAIL_REDIRECT_URI: &str = "http://127.0.0.1:8080";

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("Missing env var {}", name))
}

fn or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Build the config from `MAILBILL_*` environment variables. A
    /// `.env` file in the working directory is loaded first if one
    /// exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let storage_path = or_default("MAILBILL_STORAGE_PATH", "./");
        let db_path = format!("{}/db", storage_path.trim_end_matches('/'));
        let default_user = required("MAILBILL_GMAIL_ACCOUNT")?;
        let max_emails = or_default("MAILBILL_MAX_EMAILS", "10")
            .parse()
            .context("MAILBILL_MAX_EMAILS must be a positive integer")?;
        let default_matter_id = or_default("MAILBILL_DEFAULT_MATTER_ID", "12060094")
            .parse()
            .context("MAILBILL_DEFAULT_MATTER_ID must be an integer")?;

        // Empty counts as unset
        let openai_api_key = env::var("MAILBILL_LLM_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            storage_path,
            db_path,
            default_user,
            max_emails,
            gmail_api_base_url: or_default(
                "MAILBILL_GMAIL_API_URL",
                "https://gmail.googleapis.com",
            ),
            google_oauth_token_url: or_default(
                "MAILBILL_GOOGLE_TOKEN_URL",
                "https://oauth2.googleapis.com/token",
            ),
            gmail_api_client_id: required("MAILBILL_GMAIL_CLIENT_ID")?,
            gmail_api_client_secret: required("MAILBILL_GMAIL_CLIENT_SECRET")?,
            gmail_redirect_uri: or_default(
                "MAILBILL_GMAIL_REDIRECT_URI",
                DEFAULT_GMAIL_REDIRECT_URI,
            ),
            openai_api_hostname: or_default("MAILBILL_LLM_HOST", "https://api.together.xyz"),
            openai_api_key,
            openai_model: or_default(
                "MAILBILL_LLM_MODEL",
                "mistralai/Mistral-7B-Instruct-v0.1",
            ),
            default_matter_id,
            clio_base_url: or_default("MAILBILL_CLIO_BASE_URL", "https://eu.app.clio.com"),
            clio_client_id: required("MAILBILL_CLIO_CLIENT_ID")?,
            clio_client_secret: required("MAILBILL_CLIO_CLIENT_SECRET")?,
            clio_redirect_uri: or_default(
                "MAILBILL_CLIO_REDIRECT_URI",
                "http://127.0.0.1:8000/clio/callback",
            ),
        })
    }
}

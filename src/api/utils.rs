use anyhow::Result;

use super::state::SharedState;
use crate::google::gmail::{EmailRecord, fetch_sent};
use crate::google::oauth::access_token_for;

/// The account a request acts on, falling back to the configured
/// mailbox.
pub fn resolve_user(state: &SharedState, user: Option<String>) -> String {
    match user {
        Some(user) if !user.is_empty() => user,
        _ => state
            .read()
            .expect("Unable to read share state")
            .config
            .default_user
            .clone(),
    }
}

/// Fetch the most recent sent emails for `user`. Emails that couldn't
/// be fetched or parsed are left out.
pub async fn sent_emails(
    state: &SharedState,
    user: &str,
    limit: Option<u32>,
) -> Result<Vec<EmailRecord>> {
    let (http, config, db) = {
        let shared_state = state.read().expect("Unable to read share state");
        (
            shared_state.http.clone(),
            shared_state.config.clone(),
            shared_state.db.clone(),
        )
    };
    let access_token = access_token_for(&http, &config, &db, user).await?;
    let limit = limit.unwrap_or(config.max_emails);

    let report = fetch_sent(&http, &config.gmail_api_base_url, &access_token, limit).await?;
    let (emails, errors) = report.into_parts();
    if !errors.is_empty() {
        tracing::warn!("Skipped {} of {} sent emails", errors.len(), emails.len() + errors.len());
    }
    Ok(emails)
}

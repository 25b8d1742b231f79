use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::init_tracing;
use crate::clio::{ClioClient, SqliteSessionStore};
use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};
use crate::core::http::http_client;
use crate::google::gmail::fetch_sent;
use crate::google::oauth::access_token_for;
use crate::pipeline::push_summaries;
use crate::summarize::Summarizer;

/// One-off run of the sent mail to Clio pipeline. Uses the Clio
/// session stored by the server's login flow.
pub async fn run(user: Option<String>, config: &AppConfig) -> Result<()> {
    init_tracing();

    let user = user.unwrap_or_else(|| config.default_user.clone());
    let db = async_db(&config.db_path)
        .await
        .context("Failed to connect to db")?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;

    let client = http_client()?;
    let access_token = access_token_for(&client, config, &db, &user).await?;
    let report = fetch_sent(
        &client,
        &config.gmail_api_base_url,
        &access_token,
        config.max_emails,
    )
    .await?;
    let (emails, errors) = report.into_parts();
    for error in &errors {
        tracing::warn!("Skipped sent email: {}", error);
    }
    tracing::info!("Fetched {} sent emails for {}", emails.len(), user);

    let summarizer = Summarizer::from_config(client.clone(), config);
    let sessions = Arc::new(SqliteSessionStore::new(db));
    let clio = ClioClient::from_config(client, config, sessions);

    let result = push_summaries(&summarizer, &clio, &user, &emails).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

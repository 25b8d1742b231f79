use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};
use crate::core::http::http_client;
use crate::google::oauth::{authorization_url, exchange_code_for_token, save_refresh_token};

#[derive(clap::ValueEnum, Clone)]
pub enum ServiceKind {
    Gmail,
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_owned())
}

pub async fn run(service: ServiceKind, config: &AppConfig) -> Result<()> {
    match service {
        ServiceKind::Gmail => {
            let user_email = prompt(&format!(
                "Enter the email address you are authenticating [{}]: ",
                config.default_user
            ))?;
            let user_email = if user_email.is_empty() {
                config.default_user.clone()
            } else {
                user_email
            };

            println!(
                "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
                authorization_url(&config.gmail_api_client_id, &config.gmail_redirect_uri)
            );
            let code = prompt(
                "After approving, copy the `code` parameter from the address bar of the redirected page and paste it here: ",
            )?;

            let client = http_client()?;
            let token = exchange_code_for_token(
                &client,
                &config.google_oauth_token_url,
                &config.gmail_api_client_id,
                &config.gmail_api_client_secret,
                &code,
                &config.gmail_redirect_uri,
            )
            .await?;

            // Store the refresh token in the DB and use that to fetch an access token from now on.
            let refresh_token = token
                .refresh_token
                .ok_or(anyhow!("No refresh token in response"))?;
            let db = async_db(&config.db_path)
                .await
                .context("Failed to connect to db")?;
            db.call(|conn| {
                initialize_db(conn)?;
                Ok(())
            })
            .await?;
            save_refresh_token(&db, &user_email, &refresh_token).await?;
            println!("Refresh token for {} saved to DB.", user_email);
        }
    }

    Ok(())
}

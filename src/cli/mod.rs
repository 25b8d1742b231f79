use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod auth;
pub mod init;
pub mod push;
pub mod serve;

use auth::ServiceKind;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Create the db and its tables
    Init {},
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "8000")]
        port: String,
    },
    /// Perform OAuth authentication and store the refresh token
    Auth {
        #[arg(long, value_enum)]
        service: ServiceKind,
    },
    /// Summarize recent sent emails and create Clio activities
    Push {
        /// Mailbox and Clio session to use, defaults to the configured account
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            let config = AppConfig::from_env()?;
            init::run(&config.db_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Auth { service }) => {
            let config = AppConfig::from_env()?;
            auth::run(service, &config).await?;
        }
        Some(Command::Push { user }) => {
            let config = AppConfig::from_env()?;
            push::run(user, &config).await?;
        }
        None => {}
    }

    Ok(())
}

use anyhow::Result;
use mailbill::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

/// Every outbound call gets the same deadline. Hitting it surfaces
/// as a transport error for that one call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn http_client() -> Result<Client> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(client)
}

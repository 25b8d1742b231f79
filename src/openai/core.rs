use anyhow::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Sampling settings sent with every completion request.
#[derive(Clone, Copy, Debug)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Send one chat completion request to an OpenAI compatible API and
/// return the raw JSON response. Any non-2xx status is an error.
pub async fn completion(
    client: &Client,
    messages: &[Message],
    options: CompletionOptions,
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<Value, Error> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "max_tokens": options.max_tokens,
        "temperature": options.temperature,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let res = client
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        anyhow::bail!("Completion request failed: {} ({})", status, text);
    }
    let response = res.json().await?;

    Ok(response)
}

/// Text content of the first choice in a completion response.
pub fn first_choice_content(resp: &Value) -> Option<&str> {
    resp["choices"][0]["message"]["content"].as_str()
}

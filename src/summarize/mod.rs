//! Turn an email body into a billing entry using a chat completion
//! model.

mod extract;
mod lenient;
pub mod prompt;

pub use extract::extract_json;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::core::AppConfig;
use crate::openai::{CompletionOptions, Message, Role, completion, first_choice_content};
use lenient::{lenient_f64, lenient_i64};
use prompt::{Prompt, SYSTEM_MESSAGE, templates};

const OPTIONS: CompletionOptions = CompletionOptions {
    max_tokens: 500,
    temperature: 0.3,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    TimeEntry,
    ExpenseEntry,
}

/// A billable item as understood by the model. Which optional fields
/// are meaningful depends on `kind`: time entries use `duration` and
/// `rate`, expense entries use `price`, `quantity` and `expense_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBillingEntry")]
pub struct BillingEntry {
    pub summary: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub duration: Option<f64>,
    pub rate: Option<f64>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    #[serde(rename = "expenseType")]
    pub expense_type: Option<String>,
    #[serde(rename = "matterId")]
    pub matter_id: i64,
}

// Model replies mix camelCase and snake_case keys, sometimes both in
// one object. The camelCase key wins.
#[derive(Deserialize)]
struct RawBillingEntry {
    summary: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default, deserialize_with = "lenient_f64")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    quantity: Option<i64>,
    #[serde(rename = "expenseType", default)]
    expense_type: Option<String>,
    #[serde(rename = "expense_type", default)]
    expense_type_snake: Option<String>,
    #[serde(rename = "matterId", default, deserialize_with = "lenient_i64")]
    matter_id: Option<i64>,
    #[serde(rename = "matter_id", default, deserialize_with = "lenient_i64")]
    matter_id_snake: Option<i64>,
}

impl TryFrom<RawBillingEntry> for BillingEntry {
    type Error = String;

    fn try_from(raw: RawBillingEntry) -> Result<Self, Self::Error> {
        let matter_id = raw
            .matter_id
            .or(raw.matter_id_snake)
            .ok_or_else(|| "missing field `matterId`".to_string())?;
        Ok(Self {
            summary: raw.summary,
            kind: raw.kind,
            duration: raw.duration,
            rate: raw.rate,
            price: raw.price,
            quantity: raw.quantity,
            expense_type: raw.expense_type.or(raw.expense_type_snake),
            matter_id,
        })
    }
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("LLM API key not configured")]
    Config,
    #[error("Failed to summarize email: {0}")]
    Request(String),
    #[error("Invalid response format: {0}")]
    Format(String),
}

#[derive(Clone)]
pub struct Summarizer {
    client: Client,
    api_hostname: String,
    api_key: Option<String>,
    model: String,
    default_matter_id: i64,
}

impl Summarizer {
    pub fn new(
        client: Client,
        api_hostname: &str,
        api_key: Option<String>,
        model: &str,
        default_matter_id: i64,
    ) -> Self {
        Self {
            client,
            api_hostname: api_hostname.to_string(),
            api_key,
            model: model.to_string(),
            default_matter_id,
        }
    }

    pub fn from_config(client: Client, config: &AppConfig) -> Self {
        Self::new(
            client,
            &config.openai_api_hostname,
            config.openai_api_key.clone(),
            &config.openai_model,
            config.default_matter_id,
        )
    }

    fn render_prompt(&self, body: &str) -> Result<String, SummarizeError> {
        let registry = templates().map_err(|e| SummarizeError::Request(e.to_string()))?;
        registry
            .render(
                &Prompt::BillingEntry.to_string(),
                &json!({"body": body, "default_matter_id": self.default_matter_id}),
            )
            .map_err(|e| SummarizeError::Request(e.to_string()))
    }

    /// Summarize one email body into a billing entry. Makes exactly one
    /// request, there are no retries.
    pub async fn summarize(&self, body: &str) -> Result<BillingEntry, SummarizeError> {
        let api_key = self.api_key.as_deref().ok_or(SummarizeError::Config)?;

        let messages = vec![
            Message::new(Role::System, SYSTEM_MESSAGE),
            Message::new(Role::User, &self.render_prompt(body)?),
        ];
        let resp = completion(
            &self.client,
            &messages,
            OPTIONS,
            &self.api_hostname,
            api_key,
            &self.model,
        )
        .await
        .map_err(|e| {
            tracing::error!("API request failed: {}", e);
            SummarizeError::Request(e.to_string())
        })?;

        let output = first_choice_content(&resp)
            .ok_or_else(|| SummarizeError::Format(format!("No message content in {}", resp)))?
            .trim();
        parse_entry(output)
    }
}

/// Parse a raw model reply into a `BillingEntry`.
pub fn parse_entry(output: &str) -> Result<BillingEntry, SummarizeError> {
    let json = extract_json(output).ok_or_else(|| {
        tracing::error!("Invalid JSON response: {}", output);
        SummarizeError::Format("no JSON object in reply".to_string())
    })?;
    serde_json::from_str(json).map_err(|e| {
        tracing::error!("Invalid JSON response: {}", output);
        SummarizeError::Format(e.to_string())
    })
}

//! Fetch sent mail, summarize it, and push the results to Clio.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::clio::{ActivityResult, ClioClient};
use crate::core::BatchReport;
use crate::google::gmail::EmailRecord;
use crate::summarize::{BillingEntry, Summarizer};

/// A summarized email as returned by the summaries endpoint. When the
/// model call fails `summary` holds `{"error": ...}` instead of an
/// entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub summary: serde_json::Value,
}

/// Summarize every email. A failure is embedded in that email's result
/// and never fails the whole batch.
pub async fn summarize_emails(
    summarizer: &Summarizer,
    emails: &[EmailRecord],
) -> Vec<EmailSummary> {
    let mut results = Vec::with_capacity(emails.len());
    for email in emails {
        let summary = match summarizer.summarize(&email.body).await {
            Ok(entry) => serde_json::to_value(entry)
                .unwrap_or_else(|e| json!({"error": format!("Failed to summarize: {}", e)})),
            Err(e) => {
                tracing::error!("Error summarizing email: {}", e);
                json!({"error": format!("Failed to summarize: {}", e)})
            }
        };
        results.push(EmailSummary {
            to: email.to.clone(),
            subject: email.subject.clone(),
            summary,
        });
    }
    results
}

/// Summarize every email into billing entries, recording the ones that
/// couldn't be summarized as failures.
pub async fn collect_entries(
    summarizer: &Summarizer,
    emails: &[EmailRecord],
) -> BatchReport<BillingEntry> {
    let mut report = BatchReport::new();
    for email in emails {
        match summarizer.summarize(&email.body).await {
            Ok(entry) => report.completed(entry),
            Err(e) => {
                tracing::error!("Error summarizing email: {}", e);
                let item = email
                    .subject
                    .clone()
                    .unwrap_or_else(|| "(no subject)".to_string());
                report.failed(item, format!("Failed to summarize: {}", e));
            }
        }
    }
    report
}

/// Summarize `emails` and create a Clio activity for each entry on
/// behalf of `user_id`. Clio isn't contacted when nothing could be
/// summarized. Emails that failed to summarize are listed in the
/// result's errors ahead of any Clio errors.
pub async fn push_summaries(
    summarizer: &Summarizer,
    clio: &ClioClient,
    user_id: &str,
    emails: &[EmailRecord],
) -> Result<ActivityResult> {
    let report = collect_entries(summarizer, emails).await;
    tracing::debug!(
        "Summarized {} of {} emails",
        report.succeeded().count(),
        report.attempted()
    );

    let (entries, mut errors) = report.into_parts();
    if entries.is_empty() {
        errors.insert(0, "No summaries generated".to_string());
        return Ok(ActivityResult::failed(errors));
    }

    let mut result = clio.submit_entries(user_id, &entries).await?;
    if !errors.is_empty() {
        errors.extend(result.errors.take().unwrap_or_default());
        result.errors = Some(errors);
    }
    Ok(result)
}

//! Mapping billing entries onto Clio activities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::BatchReport;
use crate::summarize::{BillingEntry, EntryKind};

pub const DEFAULT_RATE: f64 = 200.0;
pub const DEFAULT_DURATION: f64 = 1.0;
pub const DEFAULT_PRICE: f64 = 100.0;
pub const DEFAULT_QUANTITY: i64 = 1;
pub const DEFAULT_EXPENSE_TYPE: &str = "Disbursement";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityResult {
    pub status: ActivityStatus,
    #[serde(rename = "activities_created")]
    pub created: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ActivityResult {
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            status: ActivityStatus::Error,
            created: Vec::new(),
            errors: Some(errors),
        }
    }
}

impl From<BatchReport<Value>> for ActivityResult {
    fn from(report: BatchReport<Value>) -> Self {
        let (created, errors) = report.into_parts();
        let status = if created.is_empty() {
            ActivityStatus::Error
        } else {
            ActivityStatus::Success
        };
        Self {
            status,
            created,
            errors: (!errors.is_empty()).then_some(errors),
        }
    }
}

// A zero from the model means it didn't know, same as leaving it out
fn or_default(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| *v != 0.0).unwrap_or(default)
}

/// Build the `POST /api/v4/activities` body for one entry.
pub fn build_activity_payload(entry: &BillingEntry, date: NaiveDate) -> Value {
    let date = date.format("%Y-%m-%d").to_string();
    match entry.kind {
        EntryKind::TimeEntry => json!({
            "data": {
                "type": "TimeEntry",
                "attributes": {
                    "description": entry.summary,
                    "date": date,
                    "billable": true,
                    "rate": or_default(entry.rate, DEFAULT_RATE),
                    "quantity": or_default(entry.duration, DEFAULT_DURATION),
                    "matter_id": entry.matter_id,
                }
            }
        }),
        EntryKind::ExpenseEntry => json!({
            "data": {
                "type": "ExpenseEntry",
                "attributes": {
                    "description": entry.summary,
                    "date": date,
                    "billable": true,
                    "price": or_default(entry.price, DEFAULT_PRICE),
                    "quantity": entry.quantity.filter(|q| *q != 0).unwrap_or(DEFAULT_QUANTITY),
                    "expense_type": entry
                        .expense_type
                        .as_deref()
                        .filter(|t| !t.is_empty())
                        .unwrap_or(DEFAULT_EXPENSE_TYPE),
                    "matter_id": entry.matter_id,
                }
            }
        }),
    }
}

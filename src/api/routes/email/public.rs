//! Public types for the email API
use serde::Deserialize;

pub use crate::google::gmail::EmailRecord;
pub use crate::pipeline::EmailSummary;

#[derive(Deserialize)]
pub struct SentEmailsQuery {
    pub user: Option<String>,
    pub limit: Option<u32>,
}

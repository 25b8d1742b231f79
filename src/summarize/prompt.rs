//! Prompt templates. Rendering is strict and unescaped.

use std::fmt;

use handlebars::{Handlebars, TemplateError};

#[derive(Debug)]
pub enum Prompt {
    BillingEntry,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub const SYSTEM_MESSAGE: &str = "You are a helpful legal assistant.";

const BILLING_ENTRY_PROMPT: &str = r#"
You are a helpful legal assistant. Given the email below, return a JSON object with the following fields:
- summary: a professional billing summary of the email.
- type: either "TimeEntry" or "ExpenseEntry".
  - Use "ExpenseEntry" if the email discusses client expenses (e.g. court fees, postage, etc.).
  - Use "TimeEntry" if the email is about legal work, client communication, or tasks performed.
- rate (only for TimeEntry): hourly rate or per-task rate if mentioned, default 200.
- duration (only for TimeEntry): estimated time in hours (e.g. 0.5 for 30 minutes), default 1.0.
- price (only for ExpenseEntry): the cost of the expense.
- quantity (only for ExpenseEntry): number of items or units billed, default to 1.
- expenseType (only for ExpenseEntry): choose either "Disbursement" or "Expense Recovery".
- matterId: the numeric id of the case if the email mentions one, otherwise {{default_matter_id}}.

Email:
{{body}}

Return only valid JSON:
"#;

pub fn templates<'a>() -> Result<Handlebars<'a>, TemplateError> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry.register_template_string(&Prompt::BillingEntry.to_string(), BILLING_ENTRY_PROMPT)?;
    Ok(registry)
}

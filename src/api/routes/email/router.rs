//! Router for the email API

use axum::{Router, extract::State, response::Json};
use axum_extra::extract::Query;

use super::public;
use crate::api::state::SharedState;
use crate::api::utils::{resolve_user, sent_emails};
use crate::pipeline::summarize_emails;

async fn emails_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::SentEmailsQuery>,
) -> Result<Json<Vec<public::EmailRecord>>, crate::api::public::ApiError> {
    let user = resolve_user(&state, params.user);
    let emails = sent_emails(&state, &user, params.limit).await?;
    Ok(Json(emails))
}

async fn summaries_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::SentEmailsQuery>,
) -> Result<Json<Vec<public::EmailSummary>>, crate::api::public::ApiError> {
    let user = resolve_user(&state, params.user);
    let emails = sent_emails(&state, &user, params.limit).await?;

    let summarizer = state.read().expect("Unable to read share state").summarizer.clone();
    let summaries = summarize_emails(&summarizer, &emails).await;
    Ok(Json(summaries))
}

/// Create the email router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/emails", axum::routing::get(emails_handler))
        .route("/summaries", axum::routing::get(summaries_handler))
}

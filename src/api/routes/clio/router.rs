//! Router for the Clio API

use axum::{
    Router,
    extract::State,
    response::{Json, Redirect},
};
use axum_extra::extract::Query;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::SharedState;
use crate::api::utils::{resolve_user, sent_emails};
use crate::pipeline::push_summaries;

async fn login_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::UserQuery>,
) -> Redirect {
    let user = resolve_user(&state, params.user);
    let url = state
        .read()
        .expect("Unable to read share state")
        .clio
        .authorization_url(Some(&user));
    Redirect::to(&url)
}

async fn callback_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::CallbackQuery>,
) -> Result<Redirect, ApiError> {
    if let Some(error) = params.error {
        return Err(ApiError::bad_request(format!("Authorization error: {}", error)));
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(ApiError::bad_request("Missing authorization code"));
    };

    let user = resolve_user(&state, params.state);
    let clio = state.read().expect("Unable to read share state").clio.clone();
    clio.exchange_code(&user, &code).await?;
    tracing::info!("Stored Clio session for {}", user);

    Ok(Redirect::to("/"))
}

async fn push_summary_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::UserQuery>,
) -> Result<Json<public::ActivityResult>, ApiError> {
    let user = resolve_user(&state, params.user);
    let emails = sent_emails(&state, &user, None).await?;

    let (summarizer, clio) = {
        let shared_state = state.read().expect("Unable to read share state");
        (shared_state.summarizer.clone(), shared_state.clio.clone())
    };
    let result = push_summaries(&summarizer, &clio, &user, &emails).await?;
    Ok(Json(result))
}

async fn status_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::UserQuery>,
) -> Result<Json<public::AuthStatus>, ApiError> {
    let user = resolve_user(&state, params.user);
    let clio = state.read().expect("Unable to read share state").clio.clone();
    let token = clio.token(&user).await?;

    Ok(Json(public::AuthStatus {
        authenticated: token.is_some(),
        has_access_token: token.is_some_and(|t| !t.access_token.is_empty()),
    }))
}

/// Create the Clio router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/login", axum::routing::get(login_handler))
        .route("/callback", axum::routing::get(callback_handler))
        .route("/push-summary", axum::routing::post(push_summary_handler))
        .route("/status", axum::routing::get(status_handler))
}

//! API routes module

pub mod clio;
pub mod email;

use axum::Router;

use crate::api::state::SharedState;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    // Email routes
    Router::new().merge(email::router())
}

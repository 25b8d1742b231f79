//! Public types for the Clio API
use serde::{Deserialize, Serialize};

pub use crate::clio::{ActivityResult, ActivityStatus};

#[derive(Deserialize)]
pub struct UserQuery {
    pub user: Option<String>,
}

/// Query string Clio sends back to the redirect URI. `state` carries
/// the user id handed out by the login route.
#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub has_access_token: bool,
}

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{change_password, get_profile, login_user, refresh_token};

/// Routes that accept anonymous requests; these get the stricter rate limit.
pub fn init_public_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_user))
        .route("/refresh", post(refresh_token))
}

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_profile))
        .route("/change-password", post(change_password))
}

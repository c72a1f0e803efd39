//! Authentication-related HTTP API.

mod forgot_password;
mod login;
mod register;
mod reset_password;

use axum::Router;
use axum::routing::post;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::handler))
        .route("/login", post(login::handler))
        .route("/forgot-password", post(forgot_password::handler))
        .route("/reset-password", post(reset_password::handler))
}

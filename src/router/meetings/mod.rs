//! Meetings-related HTTP API.
mod create;
mod get;

use axum::Router;
use axum::routing::{get, post};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create::handler))
        .route("/{room_id}", get(get::handler))
}

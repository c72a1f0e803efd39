//! Users-related HTTP API.
mod delete;
mod get;

use axum::Router;
use axum::routing::get;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{user_id}", get(get::handler).delete(delete::handler))
}

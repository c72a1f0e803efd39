//! Liveness probe.

use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
}

/// Tell callers the process is up.
pub async fn handler() -> Json<Response> {
    Json(Response { ok: true })
}

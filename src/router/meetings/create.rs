use axum::http::StatusCode;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::meeting::Meeting;
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 1, message = "hostId is required."))]
    pub host_id: String,
    pub title: Option<String>,
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub meeting: Meeting,
}

/// Handler to open a meeting room.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let meeting = state
        .rooms()
        .create(
            &body.host_id,
            body.title,
            body.participants.unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            success: true,
            meeting,
        }),
    ))
}

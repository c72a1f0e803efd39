use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::meeting::Meeting;

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub meeting: Meeting,
}

/// Handler to fetch a meeting by its public join code.
pub async fn handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Response>> {
    let Some(meeting) = state.rooms().find_by_room_id(&room_id).await? else {
        return Err(ServerError::NotFound("Meeting not found".to_owned()));
    };

    Ok(Json(Response {
        success: true,
        meeting,
    }))
}

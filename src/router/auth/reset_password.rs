use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::PublicAccount;
use crate::error::Result;
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,
    #[validate(length(min = 1, message = "New password is required."))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub user: PublicAccount,
}

/// Handler to redeem a reset token for a fresh credential.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let account = state
        .accounts()
        .reset_password(&body.token, &body.new_password)
        .await?;

    Ok(Json(Response {
        success: true,
        user: account.into(),
    }))
}

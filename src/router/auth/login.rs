use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::PublicAccount;
use crate::error::{Result, ServerError};
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub email: Option<String>,
    pub password: Option<String>,
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub token: String,
    pub user: PublicAccount,
}

/// Handler to sign in, either with an identity-provider token or with local
/// credentials. The token path wins when both are sent.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let service = state.accounts();

    if let Some(id_token) = body.id_token.filter(|token| !token.is_empty()) {
        let (token, login) = service.login_federated(&id_token).await?;

        return Ok(Json(Response {
            success: true,
            token,
            user: login.account().into(),
        }));
    }

    let (Some(email), Some(password)) = (
        body.email.filter(|email| !email.is_empty()),
        body.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(ServerError::BadRequest(
            "email and password are required".to_owned(),
        ));
    };

    let (token, account) = service.login(&email, &password).await?;

    Ok(Json(Response {
        success: true,
        token,
        user: account.into(),
    }))
}

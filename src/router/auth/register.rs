use axum::http::StatusCode;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::{AccountDraft, PublicAccount};
use crate::error::Result;
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    pub age: i64,
    pub password: Option<String>,
    pub federated_subject_id: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub user: PublicAccount,
}

/// Handler to register an account. Empty strings count as absent
/// credentials.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let draft = AccountDraft {
        name: body.name,
        email: body.email,
        age: body.age,
        password: body.password.filter(|password| !password.is_empty()),
        federated_subject_id: body
            .federated_subject_id
            .filter(|subject| !subject.is_empty()),
        photo_url: body.photo_url.filter(|url| !url.is_empty()),
        ..Default::default()
    };

    let account = state.accounts().register(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            success: true,
            user: account.into(),
        }),
    ))
}

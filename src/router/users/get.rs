use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::account::PublicAccount;
use crate::error::{Result, ServerError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub user: PublicAccount,
}

/// Handler to fetch one account.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Response>> {
    let Some(account) = state.accounts().get(&user_id).await? else {
        return Err(ServerError::NotFound("User not found".to_owned()));
    };

    Ok(Json(Response {
        success: true,
        user: account.into(),
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    use crate::*;

    #[tokio::test]
    async fn test_get_user_handler() {
        let app = app(router::state());

        let response = make_request(
            app.clone(),
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "name": "Ana",
                "email": "ana@example.com",
                "age": 22,
                "password": "super-secret",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = response.into_body().collect().await.unwrap().to_bytes();
        let created: serde_json::Value = serde_json::from_slice(&created).unwrap();
        let user_id = created["user"]["id"].as_str().unwrap();

        let path = format!("/api/users/{user_id}");
        let response = make_request(app, Method::GET, &path, None, String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["user"]["id"], user_id);
        assert_eq!(body["user"]["email"], "ana@example.com");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let app = app(router::state());

        let response = make_request(
            app,
            Method::GET,
            "/api/users/656f1a2b3c4d5e6f7a8b9c0d",
            None,
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "User not found");
    }
}

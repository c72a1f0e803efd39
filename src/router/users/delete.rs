use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::AuthClaims;

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
}

/// Handler to delete an account. Callers may only delete themselves.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Response>> {
    if claims.sub != user_id {
        return Err(ServerError::Forbidden(
            "Not authorized to delete this user".to_owned(),
        ));
    }

    state.accounts().delete(&user_id).await?;

    Ok(Json(Response {
        success: true,
        message: "User deleted".to_owned(),
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::*;
    use crate::*;

    /// Register an account and sign in, returning `(user id, session token)`.
    async fn signed_in_user(app: axum::Router, email: &str) -> (String, String) {
        let response = make_request(
            app.clone(),
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "name": "Ana",
                "email": email,
                "age": 22,
                "password": "super-secret",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": email, "password": "super-secret"}).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        (
            body["user"]["id"].as_str().unwrap().to_owned(),
            body["token"].as_str().unwrap().to_owned(),
        )
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let app = app(router::state());

        let (user_id, token) = signed_in_user(app.clone(), "ana@example.com").await;

        let path = format!("/api/users/{user_id}");
        let response =
            make_request(app.clone(), Method::DELETE, &path, Some(&token), String::default())
                .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert!(body.success);
        assert_eq!(body.message, "User deleted");

        // The account must be gone.
        let response = make_request(app, Method::GET, &path, None, String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_without_token() {
        let app = app(router::state());

        let (user_id, _) = signed_in_user(app.clone(), "ana@example.com").await;

        let path = format!("/api/users/{user_id}");
        let response = make_request(app, Method::DELETE, &path, None, String::default()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Missing or invalid 'Authorization' header");
    }

    #[tokio::test]
    async fn test_delete_with_garbage_token() {
        let app = app(router::state());

        let (user_id, _) = signed_in_user(app.clone(), "ana@example.com").await;

        let path = format!("/api/users/{user_id}");
        let response =
            make_request(app, Method::DELETE, &path, Some("not-a-jwt"), String::default()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_someone_else() {
        let app = app(router::state());

        let (_, token) = signed_in_user(app.clone(), "ana@example.com").await;
        let (other_id, _) = signed_in_user(app.clone(), "bob@example.com").await;

        let path = format!("/api/users/{other_id}");
        let response =
            make_request(app, Method::DELETE, &path, Some(&token), String::default()).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Not authorized to delete this user");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let app = app(router::state());

        let (user_id, token) = signed_in_user(app.clone(), "ana@example.com").await;

        let path = format!("/api/users/{user_id}");
        let response =
            make_request(app.clone(), Method::DELETE, &path, Some(&token), String::default())
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        // The token still decodes but the record is gone.
        let response =
            make_request(app, Method::DELETE, &path, Some(&token), String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

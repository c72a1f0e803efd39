use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
}

/// Handler to arm a password-reset token and mail it out.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    state.accounts().forgot_password(&body.email).await?;

    Ok(Json(Response {
        success: true,
        message: "Reset email sent".to_owned(),
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use std::sync::Arc;

    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::*;
    use crate::identity::StaticProvider;
    use crate::mail::RecordingMailer;
    use crate::*;

    async fn register(app: axum::Router, email: &str) {
        let response = make_request(
            app,
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
    }

    #[tokio::test]
    async fn test_forgot_password_handler() {
        let mailer = Arc::new(RecordingMailer::new());
        let state = router::state_with(Arc::new(StaticProvider::new("subject-1")), mailer.clone());
        let app = app(state);

        register(app.clone(), "ana@example.com").await;

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/forgot-password",
            None,
            json!({"email": "ana@example.com"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert!(body.success);
        assert_eq!(body.message, "Reset email sent");

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ana@example.com");
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let app = app(router::state());

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/forgot-password",
            None,
            json!({"email": "nobody@example.com"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forgot_password_mail_gateway_down() {
        let state = router::state_with(
            Arc::new(StaticProvider::new("subject-1")),
            Arc::new(RecordingMailer::failing()),
        );
        let app = app(state);

        register(app.clone(), "ana@example.com").await;

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/forgot-password",
            None,
            json!({"email": "ana@example.com"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_forgot_password_malformed_email() {
        let app = app(router::state());

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/forgot-password",
            None,
            json!({"email": "nope"}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

//! Error handler for agorax.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::crypto::CryptoError;
use crate::identity::ProviderError;
use crate::mail::MailError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("{0}")]
    BadRequest(String),

    #[error("Use federated sign-in (send idToken) for this account")]
    FederatedSignIn,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid identity token: {detail}")]
    IdentityToken { detail: String },

    #[error("invalid 'Authorization' header")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("cryptographic operation failed")]
    Crypto(#[from] CryptoError),

    #[error("token signing failed")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("record serialization failed")]
    Serialization(#[from] serde_json::Error),

    #[error("document store failed")]
    Store(StoreError),

    #[error("identity provider failed")]
    Provider(ProviderError),

    #[error("mail delivery failed")]
    Mail(#[from] MailError),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound("Resource not found".to_owned()),
            err => Self::Store(err),
        }
    }
}

impl From<ProviderError> for ServerError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidToken(detail) if detail.is_empty() => Self::IdentityToken {
                detail: "verification failed".to_owned(),
            },
            ProviderError::InvalidToken(detail) => Self::IdentityToken { detail },
            err => Self::Provider(err),
        }
    }
}

/// Structure for error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    success: bool,
    message: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            success: false,
            message: "Internal server error".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn parse_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| match &issue.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .message(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.message(&parse_validation_errors(validation_errors))
            }

            ServerError::Axum(rejection) => response.message(&rejection.body_text()),

            ServerError::BadRequest(_) | ServerError::FederatedSignIn => response,

            ServerError::InvalidCredentials | ServerError::IdentityToken { .. } => {
                response.status(StatusCode::UNAUTHORIZED)
            }

            ServerError::Unauthorized => response
                .message("Missing or invalid 'Authorization' header")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Forbidden(_) => response.status(StatusCode::FORBIDDEN),

            ServerError::NotFound(_) => response.status(StatusCode::NOT_FOUND),

            ServerError::Conflict(_) => response.status(StatusCode::CONFLICT),

            ServerError::Store(err) => {
                tracing::error!(error = %err, "document store returned 500 status");

                ResponseError::default()
            }

            ServerError::Provider(err) => {
                tracing::error!(error = %err, "identity provider returned 500 status");

                ResponseError::default()
            }

            ServerError::Mail(err) => {
                tracing::error!(error = %err, "mail gateway returned 500 status");

                ResponseError::default()
            }

            ServerError::Crypto(_) | ServerError::Jwt(_) | ServerError::Serialization(_) => {
                tracing::error!(error = %self, "server returned 500 status");

                ResponseError::default()
            }
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "success": false,
                "message": "Internal server error",
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

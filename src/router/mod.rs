//! HTTP API surface.

pub mod auth;
pub mod meetings;
pub mod status;
pub mod users;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::AppState;
use crate::error::ServerError;
use crate::token::Claims;

const BEARER: &str = "Bearer ";

/// JSON body extractor running `validator` rules before the handler sees the
/// payload.
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Session claims taken from the `Authorization: Bearer` header.
pub struct AuthClaims(pub Claims);

impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER))
            .ok_or(ServerError::Unauthorized)?;

        let claims = state
            .token
            .decode(token)
            .map_err(|_| ServerError::Unauthorized)?;

        Ok(AuthClaims(claims))
    }
}

#[cfg(test)]
pub(crate) fn state() -> AppState {
    use std::sync::Arc;

    use crate::identity::StaticProvider;
    use crate::mail::RecordingMailer;

    state_with(
        Arc::new(StaticProvider::new("subject-1")),
        Arc::new(RecordingMailer::new()),
    )
}

#[cfg(test)]
pub(crate) fn state_with(
    identity: std::sync::Arc<dyn crate::identity::IdentityProvider>,
    mail: std::sync::Arc<dyn crate::mail::Mailer>,
) -> AppState {
    use std::sync::Arc;

    use crate::config::{Argon2, Configuration};
    use crate::crypto::PasswordManager;
    use crate::store::MemoryStore;
    use crate::token::TokenManager;

    let argon2 = Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    };

    AppState {
        config: Arc::new(Configuration::default()),
        users: Arc::new(MemoryStore::new("id")),
        meetings: Arc::new(MemoryStore::new("id")),
        crypto: Arc::new(PasswordManager::new(Some(argon2)).unwrap()),
        token: TokenManager::new("test-secret", None),
        identity,
        mail,
    }
}

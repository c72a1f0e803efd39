//! Bridge to the federated identity provider.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

type Result<T> = std::result::Result<T, ProviderError>;

/// Claims extracted from a verified identity token.
#[derive(Clone, Debug, Default)]
pub struct IdentityClaims {
    /// Provider-side subject identifier.
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Errors surfaced by the identity bridge.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity token rejected: {0}")]
    InvalidToken(String),
    #[error("identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("identity provider returned status {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("identity provider is not configured")]
    Unconfigured,
}

/// External identity provider consumed by the credential service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a provider-issued token and expose its claims.
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims>;

    /// Administrative password override for a federated subject.
    async fn override_password(&self, subject: &str, new_password: &str) -> Result<()>;

    /// Remove the provider-side identity.
    async fn delete_identity(&self, subject: &str) -> Result<()>;
}

/// Provider speaking the Identity Toolkit REST dialect: POST endpoints named
/// `accounts:<operation>`, authenticated by an API key query parameter.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

impl HttpIdentityProvider {
    /// Create a new [`HttpIdentityProvider`].
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    async fn post(&self, operation: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let url = format!(
            "{}/v1/accounts:{}?key={}",
            self.endpoint, operation, self.api_key
        );

        Ok(self.client.post(url).json(&body).send().await?)
    }

    async fn upstream_error(response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();

        ProviderError::Upstream { status, message }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims> {
        let response = self.post("lookup", json!({ "idToken": token })).await?;
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::InvalidToken(message));
        }

        let lookup: LookupResponse = response.json().await?;
        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidToken("no matching subject".to_owned()))?;

        Ok(IdentityClaims {
            subject: user.local_id,
            email: user.email,
            name: user.display_name,
            picture: user.photo_url,
        })
    }

    async fn override_password(&self, subject: &str, new_password: &str) -> Result<()> {
        let response = self
            .post(
                "update",
                json!({ "localId": subject, "password": new_password }),
            )
            .await?;
        if !response.status().is_success() {
            return Err(Self::upstream_error(response).await);
        }

        Ok(())
    }

    async fn delete_identity(&self, subject: &str) -> Result<()> {
        let response = self.post("delete", json!({ "localId": subject })).await?;
        if !response.status().is_success() {
            return Err(Self::upstream_error(response).await);
        }

        Ok(())
    }
}

/// Fallback provider used when no endpoint is configured. Local flows keep
/// working; federated flows fail with a provider error.
pub struct DisabledProvider;

#[async_trait]
impl IdentityProvider for DisabledProvider {
    async fn verify_token(&self, _token: &str) -> Result<IdentityClaims> {
        Err(ProviderError::Unconfigured)
    }

    async fn override_password(&self, _subject: &str, _new_password: &str) -> Result<()> {
        Err(ProviderError::Unconfigured)
    }

    async fn delete_identity(&self, _subject: &str) -> Result<()> {
        Err(ProviderError::Unconfigured)
    }
}

/// Provider double returning canned claims for one expected token.
#[cfg(test)]
pub struct StaticProvider {
    pub token: String,
    pub claims: IdentityClaims,
    pub fail_override: bool,
    pub fail_delete: bool,
    pub overridden: std::sync::Mutex<Vec<(String, String)>>,
    pub deleted: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl StaticProvider {
    pub fn new(subject: &str) -> Self {
        Self {
            token: "valid-id-token".to_owned(),
            claims: IdentityClaims {
                subject: subject.to_owned(),
                email: Some(format!("{subject}@example.com")),
                name: Some("Fed User".to_owned()),
                picture: None,
            },
            fail_override: false,
            fail_delete: false,
            overridden: std::sync::Mutex::new(Vec::new()),
            deleted: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims> {
        if token == self.token {
            Ok(self.claims.clone())
        } else {
            Err(ProviderError::InvalidToken("token rejected".to_owned()))
        }
    }

    async fn override_password(&self, subject: &str, new_password: &str) -> Result<()> {
        if self.fail_override {
            return Err(ProviderError::Upstream {
                status: 500,
                message: "override refused".to_owned(),
            });
        }

        self.overridden
            .lock()
            .unwrap()
            .push((subject.to_owned(), new_password.to_owned()));
        Ok(())
    }

    async fn delete_identity(&self, subject: &str) -> Result<()> {
        if self.fail_delete {
            return Err(ProviderError::Upstream {
                status: 500,
                message: "delete refused".to_owned(),
            });
        }

        self.deleted.lock().unwrap().push(subject.to_owned());
        Ok(())
    }
}

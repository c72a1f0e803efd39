//! Credential flows on top of [`AccountRepository`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::account::{Account, AccountDraft, AccountRepository, Field};
use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::identity::{IdentityClaims, IdentityProvider};
use crate::mail::Mailer;
use crate::store::DocumentStore;
use crate::token::TokenManager;

/// Minutes a reset token stays redeemable.
const RESET_TOKEN_TTL_MINUTES: i64 = 15;
/// Token entropy before hex encoding.
const RESET_TOKEN_BYTES: usize = 32;

/// Outcome of a federated login. Provisioning is an explicit result, not a
/// side effect callers have to guess at.
#[derive(Debug)]
pub enum FederatedLogin {
    /// The subject was already linked to an account.
    LoggedIn(Account),
    /// A fresh account was provisioned from the token claims.
    Provisioned(Account),
}

impl FederatedLogin {
    /// The account regardless of how it was obtained.
    pub fn account(self) -> Account {
        match self {
            Self::LoggedIn(account) | Self::Provisioned(account) => account,
        }
    }

    pub fn provisioned(&self) -> bool {
        matches!(self, Self::Provisioned(_))
    }
}

/// Account manager.
#[derive(Clone)]
pub struct AccountService {
    pub repo: AccountRepository,
    crypto: Arc<PasswordManager>,
    token: TokenManager,
    identity: Arc<dyn IdentityProvider>,
    mail: Arc<dyn Mailer>,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(
        store: Arc<dyn DocumentStore>,
        crypto: Arc<PasswordManager>,
        token: TokenManager,
        identity: Arc<dyn IdentityProvider>,
        mail: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            repo: AccountRepository::new(store),
            crypto,
            token,
            identity,
            mail,
        }
    }

    /// Register an account carrying a local password, a federated subject or
    /// both. The plaintext is replaced by its hash before anything is stored.
    pub async fn register(&self, mut draft: AccountDraft) -> Result<Account> {
        if draft.password.is_none() && draft.federated_subject_id.is_none() {
            return Err(ServerError::BadRequest(
                "password or federatedSubjectId is required".to_owned(),
            ));
        }

        if self
            .repo
            .find_one(Field::Email, &draft.email)
            .await?
            .is_some()
        {
            return Err(ServerError::Conflict("Email already registered".to_owned()));
        }

        if let Some(password) = draft.password.take() {
            draft.password = Some(self.crypto.hash_password(&password)?);
        }

        self.repo.create(draft).await
    }

    /// Authenticate with email and password, minting a session token.
    ///
    /// Unknown emails and wrong passwords fail identically so the endpoint
    /// does not reveal which emails are registered.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Account)> {
        let Some(account) = self.repo.find_one(Field::Email, email).await? else {
            return Err(ServerError::InvalidCredentials);
        };

        let Some(hash) = &account.password else {
            if account.federated_subject_id.is_some() {
                return Err(ServerError::FederatedSignIn);
            }
            return Err(ServerError::InvalidCredentials);
        };

        if !self.crypto.verify_password(password, hash) {
            return Err(ServerError::InvalidCredentials);
        }

        let token = self.token.create(&account.id, &account.email)?;
        Ok((token, account))
    }

    /// Authenticate with an identity-provider token, provisioning a local
    /// account the first time the subject shows up.
    pub async fn login_federated(&self, id_token: &str) -> Result<(String, FederatedLogin)> {
        let claims = self.identity.verify_token(id_token).await?;

        if let Some(account) = self
            .repo
            .find_one(Field::FederatedSubjectId, &claims.subject)
            .await?
        {
            let token = self.token.create(&account.id, &account.email)?;
            return Ok((token, FederatedLogin::LoggedIn(account)));
        }

        let account = self.repo.create(Self::provision(claims)).await?;
        tracing::info!(account_id = %account.id, "provisioned account from federated login");

        let token = self.token.create(&account.id, &account.email)?;
        Ok((token, FederatedLogin::Provisioned(account)))
    }

    fn provision(claims: IdentityClaims) -> AccountDraft {
        let email = claims.email.unwrap_or_default();
        let name = claims
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| (!email.is_empty()).then(|| email.clone()))
            .unwrap_or_else(|| "Federated User".to_owned());

        AccountDraft {
            name,
            email,
            age: 0,
            password: None,
            federated_subject_id: Some(claims.subject),
            photo_url: claims.picture,
            ..Default::default()
        }
    }

    /// Arm a reset token valid for 15 minutes and send the reset email.
    ///
    /// The token is persisted before delivery is attempted, so a failed
    /// delivery surfaces as a server error while the flow stays retryable.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let Some(account) = self.repo.find_one(Field::Email, email).await? else {
            return Err(ServerError::NotFound("No account with that email".to_owned()));
        };

        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        self.repo
            .set_reset_token(&account.id, &token, expires_at)
            .await?;

        self.mail.send_reset_email(email, &token).await?;

        Ok(())
    }

    /// Redeem a reset token, replacing the credential it authorizes.
    ///
    /// Expired tokens are rejected lazily on this path; nothing sweeps them
    /// in the background.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Account> {
        let Some(account) = self
            .repo
            .find_one(Field::ResetPasswordToken, token)
            .await?
        else {
            return Err(Self::invalid_token());
        };

        if !token_still_valid(account.reset_password_expires.as_deref(), Utc::now()) {
            return Err(Self::invalid_token());
        }

        if let Some(subject) = &account.federated_subject_id {
            // The provider is authoritative for federated credentials. Local
            // state is only touched once the override went through.
            self.identity.override_password(subject, new_password).await?;
            return self.repo.clear_reset_fields(&account.id).await;
        }

        let hash = self.crypto.hash_password(new_password)?;
        self.repo.update_password(&account.id, &hash).await
    }

    fn invalid_token() -> ServerError {
        ServerError::BadRequest("Invalid or expired token".to_owned())
    }

    /// Fetch an account by id.
    pub async fn get(&self, account_id: &str) -> Result<Option<Account>> {
        self.repo.get(account_id).await
    }

    /// Delete an account. The provider-side identity is removed best effort
    /// before the local record; a provider failure is logged, not returned.
    pub async fn delete(&self, account_id: &str) -> Result<()> {
        let Some(account) = self.repo.get(account_id).await? else {
            return Err(ServerError::NotFound("User not found".to_owned()));
        };

        if let Some(subject) = &account.federated_subject_id {
            if let Err(err) = self.identity.delete_identity(subject).await {
                tracing::error!(
                    error = %err,
                    account_id = %account.id,
                    "external identity deletion failed"
                );
            }
        }

        self.repo.delete(account_id).await?;
        Ok(())
    }
}

/// A token with no expiry, an unreadable expiry or one at or past `now` is
/// no longer redeemable.
fn token_still_valid(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(expires_at) = expires_at else {
        return false;
    };
    let Ok(expires_at) = DateTime::parse_from_rfc3339(expires_at) else {
        return false;
    };

    now < expires_at
}

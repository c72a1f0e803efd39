//! Store-facing operations for the `users` collection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::account::{Account, AccountDraft};
use crate::error::Result;
use crate::store::{DocumentStore, Record, record_from};

/// Queryable fields of the `users` collection.
pub enum Field {
    Email,
    ResetPasswordToken,
    FederatedSubjectId,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Email => write!(f, "email"),
            Field::ResetPasswordToken => write!(f, "resetPasswordToken"),
            Field::FederatedSubjectId => write!(f, "federatedSubjectId"),
        }
    }
}

/// Repository to manage the `users` collection.
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn DocumentStore>,
}

impl AccountRepository {
    /// Create a new [`AccountRepository`].
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Insert a new account and return it as stored.
    pub async fn create(&self, draft: AccountDraft) -> Result<Account> {
        let record = self.store.create(record_from(draft)?).await?;

        Self::into_account(record)
    }

    /// Fetch an account by id. `None` when absent.
    pub async fn get(&self, account_id: &str) -> Result<Option<Account>> {
        self.store
            .get_by_id(account_id)
            .await?
            .map(Self::into_account)
            .transpose()
    }

    /// First account matching `value` on `field`, if any.
    pub async fn find_one(&self, field: Field, value: &str) -> Result<Option<Account>> {
        let mut criteria = Record::new();
        criteria.insert(field.to_string(), Value::String(value.to_owned()));

        self.store
            .find_one_by(criteria)
            .await?
            .map(Self::into_account)
            .transpose()
    }

    /// Arm an account with a reset token and its expiry.
    pub async fn set_reset_token(
        &self,
        account_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Account> {
        self.update(
            account_id,
            json!({
                "resetPasswordToken": token,
                "resetPasswordExpires": expires_at.to_rfc3339(),
            }),
        )
        .await
    }

    /// Replace the local credential and disarm the reset token in one store
    /// call.
    pub async fn update_password(&self, account_id: &str, new_hash: &str) -> Result<Account> {
        self.update(
            account_id,
            json!({
                "password": new_hash,
                "resetPasswordToken": null,
                "resetPasswordExpires": null,
            }),
        )
        .await
    }

    /// Disarm the reset token without touching the local credential.
    pub async fn clear_reset_fields(&self, account_id: &str) -> Result<Account> {
        self.update(
            account_id,
            json!({
                "resetPasswordToken": null,
                "resetPasswordExpires": null,
            }),
        )
        .await
    }

    /// Remove an account record.
    pub async fn delete(&self, account_id: &str) -> Result<String> {
        Ok(self.store.delete(account_id).await?)
    }

    async fn update(&self, account_id: &str, patch: Value) -> Result<Account> {
        let record = self.store.update(account_id, record_from(patch)?).await?;

        Self::into_account(record)
    }

    fn into_account(record: Record) -> Result<Account> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }
}

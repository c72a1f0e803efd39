//! Account management, local and federated.

mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account as saved on the document store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i64,
    /// Argon2 PHC string. Absent on federated-only accounts.
    pub password: Option<String>,
    pub reset_password_token: Option<String>,
    /// RFC 3339. Only meaningful together with the token.
    pub reset_password_expires: Option<String>,
    /// Provider-side subject the account is linked to.
    pub federated_subject_id: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// Insert payload for [`Account`]. Fields the caller leaves out are stripped
/// before reaching the store; `password` is kept as an explicit null so the
/// stored document always carries the field.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraft {
    pub name: String,
    pub email: String,
    pub age: i64,
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federated_subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// Allow-list projection of [`Account`] crossing the HTTP boundary. Password
/// hashes and reset state never leave the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federated_subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            age: account.age,
            federated_subject_id: account.federated_subject_id,
            photo_url: account.photo_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_account_hides_credentials() {
        let account = Account {
            id: "656f1a2b3c4d5e6f7a8b9c0d".to_owned(),
            name: "Ana".to_owned(),
            email: "ana@example.com".to_owned(),
            age: 22,
            password: Some("$argon2id$...".to_owned()),
            reset_password_token: Some("deadbeef".to_owned()),
            reset_password_expires: Some("2026-01-01T00:00:00Z".to_owned()),
            federated_subject_id: None,
            photo_url: None,
        };

        let body = serde_json::to_value(PublicAccount::from(account)).unwrap();

        assert!(body.get("password").is_none());
        assert!(body.get("resetPasswordToken").is_none());
        assert!(body.get("resetPasswordExpires").is_none());
        assert_eq!(body["name"], "Ana");
    }

    #[test]
    fn test_draft_strips_absent_fields() {
        let draft = AccountDraft {
            name: "Ana".to_owned(),
            email: "ana@example.com".to_owned(),
            age: 22,
            password: None,
            ..Default::default()
        };

        let body = serde_json::to_value(draft).unwrap();

        // Explicit null marks a local credential as absent.
        assert!(body["password"].is_null());
        assert!(body.get("federatedSubjectId").is_none());
        assert!(body.get("photoURL").is_none());
        assert!(body.get("resetPasswordToken").is_none());
    }
}

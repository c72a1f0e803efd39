//! Send password-reset emails.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::config::Mail as MailConfig;

const DEFAULT_ENDPOINT: &str = "https://api.resend.com";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail provider returned status {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("mail sending is not configured")]
    Unconfigured,
}

/// Outbound notification gateway.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a reset link built from `token` to `to`.
    async fn send_reset_email(&self, to: &str, token: &str) -> Result<(), MailError>;
}

/// Mailer speaking the Resend HTTP dialect.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    frontend_url: String,
}

impl HttpMailer {
    /// Create a new [`HttpMailer`].
    pub fn new(config: &MailConfig, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            api_key: api_key.to_owned(),
            from: config.from.clone(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_owned(),
        }
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_reset_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        let link = self.reset_link(token);
        let body = json!({
            "from": self.from,
            "to": to,
            "subject": "Reset your password",
            "html": format!(
                "<p>We received a request to reset your password.</p>\
                 <p><a href=\"{link}\">Reset password</a></p>\
                 <p>The link expires in 15 minutes and can be used once. \
                 If you did not ask for this change, ignore this email.</p>"
            ),
        });

        let response = self
            .client
            .post(format!("{}/emails", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Upstream { status, message });
        }

        tracing::info!(%to, "reset email sent");
        Ok(())
    }
}

/// Mailer used when no `mail` entry is configured. Every send fails with
/// [`MailError::Unconfigured`]; any already-armed reset token stays persisted.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_reset_email(&self, to: &str, _token: &str) -> Result<(), MailError> {
        tracing::warn!(%to, "mail sending disabled, reset email dropped");
        Err(MailError::Unconfigured)
    }
}

/// Mailer double capturing the recipient and token of each delivery.
#[cfg(test)]
pub struct RecordingMailer {
    pub fail: bool,
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            fail: false,
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_reset_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Upstream {
                status: 500,
                message: "delivery refused".to_owned(),
            });
        }

        self.sent
            .lock()
            .unwrap()
            .push((to.to_owned(), token.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link() {
        let mailer = HttpMailer::new(
            &MailConfig {
                endpoint: None,
                from: "AgoraX <noreply@agorax.example>".to_owned(),
                frontend_url: "http://localhost:5173/".to_owned(),
            },
            "re_key",
        );

        assert_eq!(
            mailer.reset_link("deadbeef"),
            "http://localhost:5173/reset-password?token=deadbeef"
        );
        assert_eq!(mailer.endpoint, DEFAULT_ENDPOINT);
    }
}

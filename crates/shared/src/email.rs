//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport. When email is disabled in configuration
//! the message is written to the log instead.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Debug, Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port);

        let builder = if self.config.smtp_username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ))
        };

        Ok(builder.build())
    }

    /// Builds the password reset message body.
    #[must_use]
    pub fn password_reset_body(to_name: &str, code: &str, valid_minutes: i64) -> String {
        format!(
            r"Hello {to_name},

You asked to reset your E-Finance password. Your verification code is:

{code}

This code expires in {valid_minutes} minutes.

If you did not request a password reset, you can ignore this email.

The E-Finance Team"
        )
    }

    /// Sends a password reset code.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_password_reset_code(
        &self,
        to_email: &str,
        to_name: &str,
        code: &str,
        valid_minutes: i64,
    ) -> Result<(), EmailError> {
        let subject = "Password reset code - E-Finance";
        let body = Self::password_reset_body(to_name, code, valid_minutes);
        self.send_email(to_email, subject, &body).await
    }

    /// Sends a generic email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        if !self.config.enabled {
            info!(to = %to_email, subject, "Email delivery disabled, message not sent");
            debug!(body, "Suppressed email body");
            return Ok(());
        }

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_transport() {
        let service = EmailService::new(EmailConfig {
            smtp_username: "user".to_string(),
            smtp_password: "password".to_string(),
            ..EmailConfig::default()
        });
        assert!(service.create_transport().is_ok());
    }

    #[test]
    fn test_password_reset_body_contains_code() {
        let body = EmailService::password_reset_body("Awa", "AB12CD", 20);
        assert!(body.contains("Hello Awa"));
        assert!(body.contains("AB12CD"));
        assert!(body.contains("20 minutes"));
    }

    #[tokio::test]
    async fn test_disabled_service_skips_delivery() {
        let service = EmailService::new(EmailConfig::default());
        let result = service
            .send_password_reset_code("user@example.com", "User", "ABC123", 20)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_recipient() {
        let service = EmailService::new(EmailConfig::default());
        let result = service.send_email("not an address", "s", "b").await;
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[test]
    fn test_email_error_display() {
        assert_eq!(
            EmailError::SendError("msg".into()).to_string(),
            "Failed to send email: msg"
        );
    }
}

//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Sent as `Authorization: Bearer` on every request.
    Access,
    /// Exchanged for a new token pair.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User email at issue time.
    pub email: String,
    /// Whether the user bypasses ownership checks.
    #[serde(default)]
    pub is_superuser: bool,
    /// Token kind.
    pub kind: TokenKind,
    /// Unique token id, used to bind refresh tokens to a session.
    pub jti: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        email: &str,
        is_superuser: bool,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            is_superuser,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub const fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// Must equal `password`.
    pub password_confirm: String,
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Currency label shown next to balances.
    pub currency: Option<String>,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh_token: String,
}

/// Logout request.
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    /// The refresh token to invalidate.
    pub refresh_token: String,
}

/// Password change for the authenticated user.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub old_password: String,
    /// New password.
    pub new_password: String,
    /// Must equal `new_password`.
    pub new_password_confirm: String,
}

/// Starts the password reset flow.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    /// Account email.
    pub email: String,
}

/// Checks a reset code without consuming it.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetValidateRequest {
    /// Account email.
    pub email: String,
    /// Code received by email.
    pub code: String,
}

/// Consumes a reset code and sets a new password.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetConfirmRequest {
    /// Account email.
    pub email: String,
    /// Code received by email.
    pub code: String,
    /// New password.
    pub new_password: String,
    /// Must equal `new_password`.
    pub new_password_confirm: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn claims_new_sets_fields() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);
        let claims = Claims::new(user_id, "a@b.c", false, TokenKind::Access, expires_at);

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.email, "a@b.c");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn claims_have_distinct_token_ids() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);
        let first = Claims::new(user_id, "a@b.c", false, TokenKind::Refresh, expires_at);
        let second = Claims::new(user_id, "a@b.c", false, TokenKind::Refresh, expires_at);
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn register_request_defaults_names() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "email": "new@example.com",
            "password": "secret123",
            "password_confirm": "secret123"
        }))
        .unwrap();

        assert!(req.first_name.is_empty());
        assert!(req.currency.is_none());
    }
}

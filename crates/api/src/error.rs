//! Mapping from domain errors to HTTP responses.
//!
//! Every failure leaves the API as `{"error": <message>, "code": <CODE>}`.
//! Server-side failures are logged here and masked in the response body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use efinance_core::auth::PasswordError;
use efinance_core::ledger::LedgerError;
use efinance_core::membership::MembershipError;
use efinance_core::stats::StatsError;
use efinance_db::{CategoryError, GroupError, MemberError, StatsQueryError, TransactionError};
use efinance_shared::{AppError, JwtError};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

/// An error ready to be rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: u16, code: &'static str, message: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message,
        }
    }

    /// 401 with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into()).into()
    }

    /// 403 with the given message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into()).into()
    }

    /// 404 with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into()).into()
    }

    /// 400 with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// 409 with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into()).into()
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Message sent to the client.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.message,
                "code": self.code,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if err.status_code() >= 500 {
            error!(error = %err, "Request failed");
        }
        Self::new(err.status_code(), err.error_code(), err.public_message())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) => Self::not_found("Record not found"),
            other => AppError::Database(other.to_string()).into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        Self::new(400, err.error_code(), err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Policy(message) => Self::validation(message),
            other => AppError::Internal(other.to_string()).into(),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::new(401, "TOKEN_EXPIRED", "Token has expired".into()),
            JwtError::EncodingError(e) => AppError::Internal(e).into(),
            JwtError::DecodingError(_) | JwtError::Invalid => {
                Self::new(401, "INVALID_TOKEN", "Invalid or malformed token".into())
            }
        }
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Ledger(e) => e.into(),
            TransactionError::Database(e) => e.into(),
        }
    }
}

impl From<MemberError> for ApiError {
    fn from(err: MemberError) -> Self {
        match err {
            MemberError::Membership(e) => e.into(),
            MemberError::GroupNotFound(_) => Self::not_found("Group not found"),
            MemberError::UserNotFound(_) => Self::not_found("User not found"),
            MemberError::Database(e) => e.into(),
        }
    }
}

impl From<GroupError> for ApiError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::Membership(e) => e.into(),
            GroupError::NotFound(_) => Self::not_found("Group not found"),
            GroupError::Database(e) => e.into(),
        }
    }
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::Ledger(e) => e.into(),
            locked @ CategoryError::TypeLocked(_) => {
                Self::new(400, "CATEGORY_TYPE_LOCKED", locked.to_string())
            }
            CategoryError::Database(e) => e.into(),
        }
    }
}

impl From<StatsQueryError> for ApiError {
    fn from(err: StatsQueryError) -> Self {
        match err {
            StatsQueryError::Stats(e) => e.into(),
            StatsQueryError::UserNotFound(_) => Self::not_found("User not found"),
            StatsQueryError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ledger_errors_keep_their_status_and_code() {
        let err = ApiError::from(LedgerError::CategoryInUse { count: 2 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "CATEGORY_IN_USE");

        let err = ApiError::from(TransactionError::Ledger(LedgerError::ReadOnlyMember));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_last_admin_guard_is_a_bad_request() {
        let err = ApiError::from(MemberError::Membership(MembershipError::LastAdminLeave));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Cannot leave: you are the last admin of this group");
    }

    #[test]
    fn test_database_errors_are_masked() {
        let err = ApiError::from(DbErr::Custom("connection reset".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_not_found_variants() {
        let err = ApiError::from(GroupError::NotFound(Uuid::nil()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err = ApiError::from(StatsQueryError::UserNotFound(Uuid::nil()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_password_policy_is_validation() {
        let err = ApiError::from(PasswordError::Policy("Password cannot be entirely numeric"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}

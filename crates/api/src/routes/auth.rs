//! Authentication, profile and password reset routes.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::DateTime;
use efinance_core::auth::{
    RESET_CODE_TTL_MINUTES, check_password_policy, generate_reset_code, hash_password,
    normalize_reset_code, verify_password,
};
use efinance_db::{
    CreateUserInput, PasswordResetRepository, SessionRepository, StatsRepository,
    UpdateProfileInput, UserRepository, entities::users,
};
use efinance_shared::auth::{
    ChangePasswordRequest, LoginRequest, LogoutRequest, PasswordResetConfirmRequest,
    PasswordResetRequest, PasswordResetValidateRequest, RefreshRequest, RegisterRequest,
};
use efinance_shared::{AppError, TokenKind, TokenPair};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::today;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Longest accepted currency label.
const MAX_CURRENCY_LEN: usize = 10;

/// Public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/password-reset/request", post(request_password_reset))
        .route(
            "/auth/password-reset/validate-code",
            post(validate_reset_code),
        )
        .route("/auth/password-reset/confirm", post(confirm_password_reset))
}

/// Auth routes that require a valid access token.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/profile", get(get_profile).patch(update_profile))
        .route("/auth/change-password", post(change_password))
        .route("/auth/dashboard", get(dashboard))
}

/// Request body for profile updates.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New currency label.
    pub currency: Option<String>,
}

fn check_passwords_match(password: &str, confirm: &str) -> Result<(), ApiError> {
    if password == confirm {
        Ok(())
    } else {
        Err(ApiError::validation("Passwords do not match"))
    }
}

fn check_currency(currency: Option<&str>) -> Result<(), ApiError> {
    match currency.map(str::trim) {
        Some(c) if c.is_empty() || c.chars().count() > MAX_CURRENCY_LEN => Err(
            ApiError::validation("Currency must be between 1 and 10 characters"),
        ),
        _ => Ok(()),
    }
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

/// Issues an access/refresh pair and stores the refresh session.
async fn issue_tokens(
    state: &AppState,
    user: &users::Model,
    user_agent: Option<&str>,
) -> Result<TokenPair, ApiError> {
    let access_token =
        state
            .jwt_service
            .generate_access_token(user.id, &user.email, user.is_superuser)?;
    let (refresh_token, claims) =
        state
            .jwt_service
            .generate_refresh_token(user.id, &user.email, user.is_superuser)?;

    let expires_at = DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AppError::Internal("refresh token expiry out of range".into()))?;
    SessionRepository::new((*state.db).clone())
        .create(user.id, &refresh_token, expires_at, user_agent)
        .await?;

    Ok(TokenPair::new(
        access_token,
        refresh_token,
        state.jwt_service.access_token_expires_in(),
    ))
}

/// POST /auth/register - Create an account and sign in.
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = UserRepository::normalize_email(&payload.email);
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("A valid email address is required"));
    }
    check_passwords_match(&payload.password, &payload.password_confirm)?;
    check_password_policy(&payload.password)?;
    check_currency(payload.currency.as_deref())?;

    let user_repo = UserRepository::new((*state.db).clone());
    if user_repo.email_exists(&email).await? {
        return Err(ApiError::conflict("A user with this email already exists"));
    }

    let user = user_repo
        .create(CreateUserInput {
            email,
            password_hash: hash_password(&payload.password)?,
            first_name: payload.first_name,
            last_name: payload.last_name,
            currency: payload.currency,
        })
        .await?;

    let tokens = issue_tokens(&state, &user, user_agent(&headers)).await?;
    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created",
            "user": user,
            "tokens": tokens,
        })),
    ))
}

/// POST /auth/login - Authenticate with email and password.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_repo = UserRepository::new((*state.db).clone());

    let Some(user) = user_repo.find_by_email(&payload.email).await? else {
        info!("Login attempt for unknown email");
        return Err(ApiError::unauthorized("Invalid email or password"));
    };
    if !user.is_active {
        return Err(ApiError::unauthorized("This account has been disabled"));
    }
    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    user_repo.touch_last_login(user.id).await?;
    let tokens = issue_tokens(&state, &user, user_agent(&headers)).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({
        "user": user,
        "tokens": tokens,
    })))
}

/// POST /auth/refresh - Rotate a refresh token.
///
/// The presented session is revoked and a new one issued, so each refresh
/// token works once.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state
        .jwt_service
        .validate_kind(&payload.refresh_token, TokenKind::Refresh)?;

    let session_repo = SessionRepository::new((*state.db).clone());
    let session = session_repo
        .find_by_token(&payload.refresh_token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Session has been revoked or expired"))?;

    let user = UserRepository::new((*state.db).clone())
        .find_by_id(claims.user_id())
        .await?
        .filter(|u| u.is_active && u.id == session.user_id)
        .ok_or_else(|| ApiError::unauthorized("Session has been revoked or expired"))?;

    session_repo.revoke(session.id).await?;
    let tokens = issue_tokens(&state, &user, user_agent(&headers)).await?;

    Ok(Json(tokens))
}

/// POST /auth/logout - Revoke the caller's refresh token.
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<LogoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_repo = SessionRepository::new((*state.db).clone());
    let session = session_repo
        .find_by_token(&payload.refresh_token)
        .await?
        .filter(|s| s.user_id == auth.user_id())
        .ok_or_else(|| ApiError::validation("Invalid refresh token"))?;

    session_repo.revoke(session.id).await?;
    info!(user_id = %auth.user_id(), "User logged out");

    Ok(Json(json!({ "message": "Logged out" })))
}

/// GET /auth/profile - The caller's account.
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

/// PATCH /auth/profile - Update names and currency.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_currency(payload.currency.as_deref())?;

    let user = UserRepository::new((*state.db).clone())
        .update_profile(
            auth.user_id(),
            UpdateProfileInput {
                first_name: payload.first_name,
                last_name: payload.last_name,
                currency: payload.currency,
            },
        )
        .await?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

/// POST /auth/change-password - Replace the password and end other sessions.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&payload.old_password, &user.password_hash)? {
        return Err(ApiError::validation("Current password is incorrect"));
    }
    check_passwords_match(&payload.new_password, &payload.new_password_confirm)?;
    check_password_policy(&payload.new_password)?;

    user_repo
        .update_password(user.id, &hash_password(&payload.new_password)?)
        .await?;
    let revoked = SessionRepository::new((*state.db).clone())
        .revoke_all_user_sessions(user.id)
        .await?;

    info!(user_id = %user.id, revoked, "Password changed");
    Ok(Json(json!({ "message": "Password changed" })))
}

/// GET /auth/dashboard - Balances, current month and latest transactions.
async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = StatsRepository::new((*state.db).clone())
        .dashboard(auth.user_id(), today())
        .await?;
    Ok(Json(dashboard))
}

/// POST /auth/password-reset/request - E-mail a reset code.
///
/// The response is the same whether or not the account exists.
async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_email(&payload.email)
        .await?
        .filter(|u| u.is_active);

    if let Some(user) = user {
        let code = generate_reset_code();
        PasswordResetRepository::new((*state.db).clone())
            .issue(user.id, &code)
            .await?;

        if let Err(e) = state
            .email_service
            .send_password_reset_code(
                &user.email,
                &user.display_name(),
                &code,
                RESET_CODE_TTL_MINUTES,
            )
            .await
        {
            error!(user_id = %user.id, error = %e, "Failed to send password reset email");
        } else {
            info!(user_id = %user.id, "Password reset code sent");
        }
    }

    Ok(Json(json!({
        "message": "If an account exists for this email, a reset code has been sent"
    })))
}

/// Resolves the user and live code for a reset attempt.
async fn find_reset_target(
    state: &AppState,
    email: &str,
    code: &str,
) -> Result<users::Model, ApiError> {
    let invalid = || ApiError::validation("Invalid or expired code");

    let user = UserRepository::new((*state.db).clone())
        .find_by_email(email)
        .await?
        .ok_or_else(invalid)?;
    PasswordResetRepository::new((*state.db).clone())
        .find_valid(user.id, &normalize_reset_code(code))
        .await?
        .ok_or_else(invalid)?;

    Ok(user)
}

/// POST /auth/password-reset/validate-code - Check a code without using it.
async fn validate_reset_code(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetValidateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    find_reset_target(&state, &payload.email, &payload.code).await?;
    Ok(Json(json!({ "valid": true })))
}

/// POST /auth/password-reset/confirm - Set a new password with a code.
async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_passwords_match(&payload.new_password, &payload.new_password_confirm)?;
    check_password_policy(&payload.new_password)?;

    let user = find_reset_target(&state, &payload.email, &payload.code).await?;
    PasswordResetRepository::new((*state.db).clone())
        .complete_reset(user.id, &hash_password(&payload.new_password)?)
        .await?;

    Ok(Json(json!({ "message": "Password has been reset" })))
}

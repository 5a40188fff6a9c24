//! Authentication helpers.
//!
//! This module provides:
//! - Password hashing and verification with Argon2id
//! - The minimal password policy applied on register/change/reset
//! - Password reset code generation

mod password;
mod reset_code;

pub use password::{
    MIN_PASSWORD_LEN, PasswordError, check_password_policy, hash_password, verify_password,
};
pub use reset_code::{
    RESET_CODE_LENGTH, RESET_CODE_TTL_MINUTES, generate_reset_code, normalize_reset_code,
};

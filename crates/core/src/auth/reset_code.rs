//! Short codes e-mailed during password reset.

use rand::Rng;

/// Number of characters in a reset code.
pub const RESET_CODE_LENGTH: usize = 6;

/// Minutes a reset code stays valid.
pub const RESET_CODE_TTL_MINUTES: i64 = 20;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random uppercase alphanumeric reset code.
#[must_use]
pub fn generate_reset_code() -> String {
    let mut rng = rand::rng();
    (0..RESET_CODE_LENGTH)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Normalizes user input (trim, uppercase) before comparison.
#[must_use]
pub fn normalize_reset_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

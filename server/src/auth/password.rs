use argon2::Config;
use rand::Rng;
use thiserror::Error;

const SALT_BYTES: usize = 16;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] argon2::Error);

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt: [u8; SALT_BYTES] = rand::thread_rng().gen();
    Ok(argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(encoded: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}

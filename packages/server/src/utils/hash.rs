use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::Rng;
use std::sync::OnceLock;

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes)?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Hash on the blocking pool; argon2 is too slow for an async worker thread.
pub async fn hash_password_blocking(password: String) -> Result<String, crate::error::AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| crate::error::AppError::Internal(format!("Hash task failed: {}", e)))?
        .map_err(|e| crate::error::AppError::Internal(format!("Password hash error: {}", e)))
}

/// Verify on the blocking pool.
pub async fn verify_password_blocking(
    password: String,
    hash: String,
) -> Result<bool, crate::error::AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| crate::error::AppError::Internal(format!("Verify task failed: {}", e)))?
        .map_err(|e| crate::error::AppError::Internal(format!("Password verify error: {}", e)))
}

/// Stand-in hash checked when a login names no known profile.
fn dummy_hash() -> Result<&'static str, argon2::password_hash::Error> {
    static DUMMY: OnceLock<String> = OnceLock::new();
    if let Some(hash) = DUMMY.get() {
        return Ok(hash.as_str());
    }
    let hash = hash_password("unknown-profile-placeholder")?;
    Ok(DUMMY.get_or_init(|| hash).as_str())
}

/// Run a full argon2 verification that always fails.
pub fn verify_dummy(password: &str) -> Result<bool, argon2::password_hash::Error> {
    verify_password(password, dummy_hash()?).map(|_| false)
}

/// [`verify_dummy`] on the blocking pool.
pub async fn verify_dummy_blocking(password: String) -> Result<bool, crate::error::AppError> {
    tokio::task::spawn_blocking(move || verify_dummy(&password))
        .await
        .map_err(|e| crate::error::AppError::Internal(format!("Verify task failed: {}", e)))?
        .map_err(|e| crate::error::AppError::Internal(format!("Password verify error: {}", e)))
}

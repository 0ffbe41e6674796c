use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use rand::Rng;

/// 32 random bytes, base64 encoded. Used as the JWT secret when none is
/// configured.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    general_purpose::STANDARD.encode(bytes)
}

/// bcrypt hash of a plain-text password
pub fn hash_password(password: &str) -> Result<String> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    Ok(hash)
}

/// Check a plain-text password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

//! # Password hashing and verification: Argon2id
//!
//! - [`hash_password`] hashes with the default (memory-hard) Argon2id
//!   parameters and returns a PHC-format string
//!   (`$argon2id$v=19$m=19456,t=2,p=1$...`).
//! - [`hash_password_with`] takes an explicit hasher, for callers that need
//!   cheaper parameters (the in-memory provider).
//! - [`verify_password`] reads the parameters back out of the PHC string, so it
//!   verifies hashes produced by either function.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, String> {
    hash_password_with(&Argon2::default(), password)
}

/// Hash a password with the given Argon2 instance.
pub fn hash_password_with(argon2: &Argon2<'_>, password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

//! Argon2id password hashing
//!
//! The async entry points run the hash on tokio's blocking pool.

use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

use crate::models::Password;

/// Stand-in hash with the default cost parameters. Logins for unknown
/// usernames verify against it so they take as long as a wrong password.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$WbaB9xAKH2lc7yKL4YPPJg$u+a7CuUHjcgesU1M2nd7rXpqhmh/CCI0m58XI7eRVnY";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<password_hash::Error> for PasswordError {
    fn from(e: password_hash::Error) -> Self {
        Self::Hash(e.to_string())
    }
}

/// Hash a password into a PHC string (`$argon2id$...`).
pub async fn hash_password(password: &Password) -> Result<String, PasswordError> {
    let plain = password.expose().to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&plain)).await?
}

/// Check a plaintext password against a stored PHC string.
///
/// A wrong password is `Ok(false)`; only a malformed hash is an error.
pub async fn verify_password(plain: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_blocking(&plain, &hash)).await?
}

/// Burn one verification for a username that does not exist.
pub async fn verify_unknown_user(plain: String) -> Result<(), PasswordError> {
    verify_password(plain, DUMMY_HASH.to_owned()).await.map(|_| ())
}

pub(crate) fn hash_blocking(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(plain.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub(crate) fn verify_blocking(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_blocking("password123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_blocking("password123", &hash).unwrap());
        assert!(!verify_blocking("password124", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        let a = hash_blocking("same-password").unwrap();
        let b = hash_blocking("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_error() {
        assert!(verify_blocking("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn dummy_hash_matches_default_cost() {
        let fresh = hash_blocking("password123").unwrap();
        let params = |h: &str| h.split('$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(params(DUMMY_HASH), params(&fresh));
        assert!(!verify_blocking("password123", DUMMY_HASH).unwrap());
    }

    #[tokio::test]
    async fn unknown_user_verification_succeeds() {
        verify_unknown_user("anything".into()).await.unwrap();
    }

    #[tokio::test]
    async fn async_wrappers() {
        let pw = Password::new("secret-pw").unwrap();
        let hash = hash_password(&pw).await.unwrap();
        assert!(verify_password("secret-pw".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong-pw".into(), hash).await.unwrap());
    }
}

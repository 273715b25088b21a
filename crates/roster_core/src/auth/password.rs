//! One-way password hashing for administrator secrets.
//!
//! Stored form is an Argon2id PHC string (`$argon2id$v=19$...`) carrying its
//! own parameters and a fresh random salt per hash.

use crate::auth::gate::{AuthError, AuthResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Opaque one-way transform used for admin secrets.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, secret: &str) -> AuthResult<String>;
    /// Returns whether `secret` produces `stored`; malformed `stored` is `false`.
    fn verify(&self, secret: &str, stored: &str) -> bool;
}

/// Argon2id hasher with the crate's default cost parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, secret: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    fn verify(&self, secret: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

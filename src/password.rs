use actix_web::web;

use crate::error::AppError;
use crate::validation::PASSWORD_MAX_BYTES;

/// bcrypt hashing run on the blocking pool.
///
/// Input past bcrypt's key limit is never truncated into a match.
/// Holds a hash of a throwaway password so a login for an unknown username
/// or an oversized password still pays for one verification.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let dummy_hash = bcrypt::non_truncating_hash("dummy-password-for-unknown-users", cost)?;
        Ok(PasswordHasher { cost, dummy_hash })
    }

    pub async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.cost;
        let hashed = web::block(move || bcrypt::non_truncating_hash(password, cost))
            .await
            .map_err(|err| AppError::Internal(err.to_string()))??;
        Ok(hashed)
    }

    /// Checks `password` against `hash`, or against the dummy hash when there
    /// is no stored user or the password is too long to have been stored.
    /// A malformed stored hash counts as a mismatch.
    pub async fn verify(&self, password: String, hash: Option<String>) -> Result<bool, AppError> {
        let mut password = password.into_bytes();
        let hash = hash.filter(|_| password.len() <= PASSWORD_MAX_BYTES);
        let known = hash.is_some();
        let hash = hash.unwrap_or_else(|| self.dummy_hash.clone());
        password.truncate(PASSWORD_MAX_BYTES);
        let matched =
            web::block(move || bcrypt::non_truncating_verify(password, &hash).unwrap_or(false))
                .await
                .map_err(|err| AppError::Internal(err.to_string()))?;
        Ok(known && matched)
    }
}

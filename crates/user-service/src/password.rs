//! Password hashing.
//!
//! bcrypt is deliberately slow, so both hashing and verification run on the
//! blocking thread pool instead of stalling the async workers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    /// Returns `false` for a mismatch and for a malformed stored hash.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;

        match outcome {
            Ok(matches) => Ok(matches),
            Err(err) => {
                tracing::warn!(error = %err, "stored password hash could not be verified");
                Ok(false)
            }
        }
    }
}

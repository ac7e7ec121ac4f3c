use bcrypt::{hash, verify};

use super::AuthError;

/// bcrypt wrapper with a configurable work factor.
///
/// Every call to [`PasswordHasher::hash`] draws a fresh salt, so two digests
/// of the same password differ; compare with [`PasswordHasher::verify`] only.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash(password, self.cost)
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// A malformed digest simply fails verification.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        verify(password, digest).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

//! Bcrypt password hashing implementation.

use quill_core::ports::{AuthError, PasswordService};

/// Bcrypt-based password service with a single uniform work factor.
pub struct BcryptPasswordService {
    cost: u32,
}

impl BcryptPasswordService {
    pub const DEFAULT_COST: u32 = 12;

    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn from_env() -> Self {
        let cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::DEFAULT_COST);
        Self::new(cost)
    }
}

impl Default for BcryptPasswordService {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COST)
    }
}

impl PasswordService for BcryptPasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        bcrypt::verify(password, hash).map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the test fast; production uses DEFAULT_COST.
    fn service() -> BcryptPasswordService {
        BcryptPasswordService::new(4)
    }

    #[test]
    fn hash_and_verify() {
        let service = service();
        let password = "secure_password_123";

        let hash = service.hash(password).unwrap();
        assert_ne!(hash, password);
        assert!(service.verify(password, &hash).unwrap());
        assert!(!service.verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let service = service();

        assert!(service.verify("whatever", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn same_password_hashes_differently() {
        let service = service();

        let a = service.hash("password1").unwrap();
        let b = service.hash("password1").unwrap();

        assert_ne!(a, b);
    }
}

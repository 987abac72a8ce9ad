//! Authentication ports.

use uuid::Uuid;

use crate::domain::Role;

/// Claims carried by a verified bearer token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Token service - issues and verifies signed, expiring bearer tokens.
pub trait TokenService: Send + Sync {
    /// Issue a token embedding the user's identity and role.
    fn issue(&self, user_id: Uuid, role: Role) -> Result<String, AuthError>;

    /// Verify a token and decode its claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash. Returns `false` on mismatch;
    /// errors only when the hash itself is malformed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    Expired,

    #[error("Token is not valid")]
    InvalidToken(String),

    #[error("No token, authorization denied")]
    MissingToken,

    #[error("Hashing error: {0}")]
    Hashing(String),
}

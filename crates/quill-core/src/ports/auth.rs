//! Authentication ports: the identity token codec and password hashing.

use uuid::Uuid;

/// Claims carried by a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub issued_at: i64,
    pub exp: i64,
}

/// Identity token codec.
///
/// Verification is all-or-nothing: a token with a bad signature, a malformed body,
/// a foreign issuer or a past expiry yields an error and never partial claims.
pub trait TokenService: Send + Sync {
    /// Issue a signed, time-bounded token for a user.
    fn issue(&self, user_id: Uuid) -> Result<String, AuthError>;

    /// Verify a token and return its claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of freshly issued tokens, in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password with a fresh salt.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authentication token")]
    MissingAuth,

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}

impl AuthError {
    /// True for every failure that means "the presented token cannot be trusted".
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth
        )
    }
}

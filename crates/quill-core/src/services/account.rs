//! Account registration, login and profile lookup.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::User;
use crate::error::{DomainError, DomainResult};
use crate::ports::{PasswordService, TokenService, UserRepository};

use super::require_non_empty;

const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;

/// A freshly issued identity token for `user`.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    fn issue(&self, user: User) -> DomainResult<IssuedToken> {
        let token = self.tokens.issue(user.id)?;
        Ok(IssuedToken {
            user,
            token,
            expires_in: self.tokens.expiration_seconds(),
        })
    }

    /// Create an account and sign the new user in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> DomainResult<IssuedToken> {
        let username = username.trim();
        require_non_empty("Username", username)?;
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(DomainError::validation(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }

        let email = User::normalize_email(email);
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(DomainError::validation("Invalid email address")),
        }
        if email.chars().count() > MAX_EMAIL_LEN {
            return Err(DomainError::validation(format!(
                "Email must be at most {MAX_EMAIL_LEN} characters"
            )));
        }

        if password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate("Email already registered".into()));
        }
        if self.users.find_by_username(username).await?.is_some() {
            return Err(DomainError::Duplicate("Username already taken".into()));
        }

        let password_hash = self.passwords.hash(password)?;
        let user = User::new(username.to_string(), &email, password_hash);
        let saved = self.users.save(user).await?;

        self.issue(saved)
    }

    /// Exchange email and password for a token.
    ///
    /// An unknown email and a wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<IssuedToken> {
        let user = self
            .users
            .find_by_email(&User::normalize_email(email))
            .await?
            .ok_or(DomainError::Unauthorized)?;

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(DomainError::Unauthorized);
        }

        self.issue(user)
    }

    /// The account behind a verified token.
    pub async fn profile(&self, user_id: Uuid) -> DomainResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }
}

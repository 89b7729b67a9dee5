//! The caller's session.

use quill_shared::dto::{AuthResponse, UserResponse};

/// Identity of the signed-in user for the lifetime of a session.
///
/// An empty session is anonymous. `load` starts a session from a fresh token and
/// `clear` ends it; nothing else changes the token.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<UserResponse>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session from an auth response. Any previous user is forgotten.
    pub fn load(&mut self, auth: AuthResponse) {
        self.token = Some(auth.token);
        self.user = None;
    }

    /// Attach the profile fetched for the current token.
    pub fn set_user(&mut self, user: UserResponse) {
        if self.token.is_some() {
            self.user = Some(user);
        }
    }

    /// Sign out.
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserResponse> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn auth(token: &str) -> AuthResponse {
        AuthResponse {
            token: token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
        }
    }

    fn profile() -> UserResponse {
        UserResponse {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_load_and_clear() {
        let mut session = Session::new();
        assert!(!session.is_authenticated());

        session.load(auth("t1"));
        session.set_user(profile());
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(session.user().map(|u| u.username.as_str()), Some("alice"));

        session.clear();
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_reload_drops_previous_user() {
        let mut session = Session::new();
        session.load(auth("t1"));
        session.set_user(profile());

        session.load(auth("t2"));
        assert_eq!(session.token(), Some("t2"));
        assert!(session.user().is_none());
    }

    #[test]
    fn test_anonymous_session_ignores_profile() {
        let mut session = Session::new();
        session.set_user(profile());
        assert!(session.user().is_none());
    }
}

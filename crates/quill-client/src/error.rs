//! Client error types.

use quill_shared::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a problem body.
    #[error("API error {}: {}", .0.status, .0.title)]
    Api(ErrorResponse),

    #[error("Not signed in")]
    NotSignedIn,
}

impl ClientError {
    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(problem) => Some(problem.status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::NotSignedIn => None,
        }
    }

    /// True when the server rejected the session's token.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

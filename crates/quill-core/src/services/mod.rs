//! Application services - the post, comment and account aggregates.
//!
//! Every mutation goes through [`crate::authorize`] against the recorded owner before
//! touching the store. Read paths return projected payloads.

mod account;
mod comment;
mod post;

pub use account::{AccountService, IssuedToken};
pub use comment::CommentService;
pub use post::{PostChanges, PostService};

use crate::error::{DomainError, DomainResult};

/// Reject empty (or whitespace-only) required fields.
pub(crate) fn require_non_empty(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        Err(DomainError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

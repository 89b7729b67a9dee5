//! Ownership guard - the single authorization rule for mutations.

use uuid::Uuid;

use crate::error::DomainError;

/// Allow the caller to mutate a resource only if they are its recorded owner.
///
/// Reads never go through this check; posts and comments are publicly readable.
pub fn authorize(resource_owner_id: Uuid, caller_id: Uuid) -> Result<(), DomainError> {
    if resource_owner_id == caller_id {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Deleting a missing entity is `RepoError::NotFound`.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Batch lookup used by the projection layer. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;
}

/// Post repository.
///
/// Listings are ordered newest first by `created_at`, ties broken by id descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All published posts.
    async fn find_published(&self) -> Result<Vec<Post>, RepoError>;

    /// Every post owned by `user_id`, whatever its status.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Delete a post and all of its comments atomically.
    /// Returns the number of comments removed.
    async fn delete_with_comments(&self, id: Uuid) -> Result<u64, RepoError>;
}

/// Comment repository.
///
/// Saving a comment whose post does not exist fails with `RepoError::Constraint`.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments attached to `post_id`, newest first (ties by id descending).
    async fn find_by_post_id(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

//! Post aggregate.

use std::sync::Arc;

use uuid::Uuid;

use quill_shared::dto::{PostDetailResponse, PostResponse};

use crate::domain::{Comment, Post, PostStatus, normalize_tags};
use crate::error::{DomainError, DomainResult, RepoError};
use crate::guard::authorize;
use crate::ports::{CommentRepository, PostRepository};
use crate::projection::Projector;

use super::require_non_empty;

/// Owner-supplied changes to a post. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
}

/// Posts and the comment list derived from them.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    projector: Projector,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        projector: Projector,
    ) -> Self {
        Self {
            posts,
            comments,
            projector,
        }
    }

    async fn load(&self, post_id: Uuid) -> DomainResult<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }

    /// Load a post as `viewer_id` sees it. Drafts exist only for their owner.
    async fn load_visible(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> DomainResult<Post> {
        let post = self.load(post_id).await?;
        if !post.is_published() && viewer_id != Some(post.user_id) {
            return Err(DomainError::not_found("Post", post_id));
        }
        Ok(post)
    }

    /// Whether the post exists for `viewer_id`.
    pub async fn is_visible(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> DomainResult<bool> {
        match self.load_visible(post_id, viewer_id).await {
            Ok(_) => Ok(true),
            Err(DomainError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a published post owned by `owner_id`.
    pub async fn create(
        &self,
        title: &str,
        content: &str,
        owner_id: Uuid,
    ) -> DomainResult<PostResponse> {
        require_non_empty("Title", title)?;
        require_non_empty("Content", content)?;

        let post = Post::new(owner_id, title.trim().to_string(), content.to_string());
        let saved = self.posts.save(post).await?;
        self.projector.post(saved).await
    }

    /// Rewrite a post. Only its owner may do this.
    pub async fn update(
        &self,
        post_id: Uuid,
        changes: PostChanges,
        caller_id: Uuid,
    ) -> DomainResult<PostResponse> {
        let mut post = self.load(post_id).await?;
        authorize(post.user_id, caller_id)?;

        require_non_empty("Title", &changes.title)?;
        require_non_empty("Content", &changes.content)?;

        post.rewrite(changes.title.trim().to_string(), changes.content);
        if let Some(status) = changes.status {
            post.status = status;
        }
        if let Some(tags) = changes.tags {
            post.tags = normalize_tags(tags);
        }

        let saved = self.posts.save(post).await?;
        self.projector.post(saved).await
    }

    /// Delete a post and, in the same transaction, every comment on it.
    ///
    /// Returns how many comments went with it.
    pub async fn delete(&self, post_id: Uuid, caller_id: Uuid) -> DomainResult<u64> {
        let post = self.load(post_id).await?;
        authorize(post.user_id, caller_id)?;

        self.posts
            .delete_with_comments(post_id)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => DomainError::not_found("Post", post_id),
                other => other.into(),
            })
    }

    /// Attach a new comment to a post.
    ///
    /// The comment list is derived from the comments' `post_id`, so appending is the
    /// single insert of the comment row. Only the owner can comment on a draft.
    ///
    /// A referential failure on insert means either the post was deleted after the
    /// visibility check (`NotFound`) or the author's account is gone (`Unauthorized`).
    pub async fn append_comment(&self, post_id: Uuid, comment: Comment) -> DomainResult<Comment> {
        if comment.post_id != post_id {
            return Err(DomainError::validation("Comment belongs to a different post"));
        }

        self.load_visible(post_id, Some(comment.author_id)).await?;

        match self.comments.save(comment).await {
            Ok(saved) => Ok(saved),
            Err(RepoError::Constraint(_)) => match self.posts.find_by_id(post_id).await? {
                None => Err(DomainError::not_found("Post", post_id)),
                Some(_) => Err(DomainError::Unauthorized),
            },
            Err(other) => Err(other.into()),
        }
    }

    /// Fetch a post with its author and comments resolved.
    ///
    /// Drafts are only visible to their owner.
    pub async fn get(
        &self,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> DomainResult<PostDetailResponse> {
        let post = self.load_visible(post_id, viewer_id).await?;

        let comments = self.comments.find_by_post_id(post_id).await?;
        self.projector.post_detail(post, comments).await
    }

    /// Published posts, newest first.
    pub async fn list_published(&self) -> DomainResult<Vec<PostResponse>> {
        let posts = self.posts.find_published().await?;
        self.projector.posts(posts).await
    }

    /// Every post owned by `owner_id`, drafts included, newest first.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> DomainResult<Vec<PostResponse>> {
        let posts = self.posts.find_by_user_id(owner_id).await?;
        self.projector.posts(posts).await
    }
}

//! Comment aggregate.

use std::sync::Arc;

use uuid::Uuid;

use quill_shared::dto::CommentResponse;

use crate::domain::Comment;
use crate::error::{DomainError, DomainResult, RepoError};
use crate::guard::authorize;
use crate::ports::CommentRepository;
use crate::projection::Projector;

use super::PostService;
use super::require_non_empty;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: PostService,
    projector: Projector,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: PostService,
        projector: Projector,
    ) -> Self {
        Self {
            comments,
            posts,
            projector,
        }
    }

    /// Comment on a post as `author_id`.
    pub async fn create(
        &self,
        post_id: Uuid,
        content: &str,
        author_id: Uuid,
    ) -> DomainResult<CommentResponse> {
        require_non_empty("Content", content)?;

        let comment = Comment::new(post_id, author_id, content.to_string());
        let saved = self.posts.append_comment(post_id, comment).await?;
        self.projector.comment(saved).await
    }

    /// Comments on a post, newest first.
    ///
    /// An unknown post has no comments, and neither does a draft seen by anyone but
    /// its owner.
    pub async fn list_by_post(
        &self,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> DomainResult<Vec<CommentResponse>> {
        if !self.posts.is_visible(post_id, viewer_id).await? {
            return Ok(Vec::new());
        }

        let comments = self.comments.find_by_post_id(post_id).await?;
        self.projector.comments(comments).await
    }

    /// Delete a comment. Only its author may do this.
    pub async fn delete(&self, comment_id: Uuid, caller_id: Uuid) -> DomainResult<()> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;

        authorize(comment.author_id, caller_id)?;

        self.comments.delete(comment_id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("Comment", comment_id),
            other => other.into(),
        })
    }
}

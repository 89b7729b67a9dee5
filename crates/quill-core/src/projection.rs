//! Query/projection layer - shapes stored entities into response payloads.
//!
//! Owner and author ids are resolved to [`AuthorResponse`] (id + username) in one
//! batched lookup per call. Nothing else about a user leaves this layer.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use quill_shared::dto::{AuthorResponse, CommentResponse, PostDetailResponse, PostResponse};

use crate::domain::{Comment, Post};
use crate::error::DomainResult;
use crate::ports::UserRepository;

/// Username shown for an author id that no longer resolves to an account.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Sort newest first by creation time; equal timestamps fall back to id descending.
///
/// Ids are UUIDv7, so the tie-break is reverse insertion order.
pub fn sort_newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (DateTime<Utc>, Uuid),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Resolves user references on read paths.
#[derive(Clone)]
pub struct Projector {
    users: Arc<dyn UserRepository>,
}

impl Projector {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    async fn authors(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> DomainResult<HashMap<Uuid, AuthorResponse>> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = self.users.find_by_ids(&ids).await?;
        Ok(users
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    AuthorResponse {
                        id: u.id,
                        username: u.username,
                    },
                )
            })
            .collect())
    }

    fn author_of(authors: &HashMap<Uuid, AuthorResponse>, id: Uuid) -> AuthorResponse {
        authors.get(&id).cloned().unwrap_or_else(|| AuthorResponse {
            id,
            username: DELETED_AUTHOR.to_string(),
        })
    }

    fn post_response(post: Post, author: AuthorResponse) -> PostResponse {
        PostResponse {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            status: post.status.to_string(),
            tags: post.tags,
            author,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    fn comment_response(comment: Comment, author: AuthorResponse) -> CommentResponse {
        CommentResponse {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            author,
            created_at: comment.created_at,
        }
    }

    /// Project posts, keeping their order.
    pub async fn posts(&self, posts: Vec<Post>) -> DomainResult<Vec<PostResponse>> {
        let authors = self.authors(posts.iter().map(|p| p.user_id)).await?;
        Ok(posts
            .into_iter()
            .map(|p| {
                let author = Self::author_of(&authors, p.user_id);
                Self::post_response(p, author)
            })
            .collect())
    }

    pub async fn post(&self, post: Post) -> DomainResult<PostResponse> {
        let authors = self.authors([post.user_id]).await?;
        let author = Self::author_of(&authors, post.user_id);
        Ok(Self::post_response(post, author))
    }

    /// Project comments, keeping their order.
    pub async fn comments(&self, comments: Vec<Comment>) -> DomainResult<Vec<CommentResponse>> {
        let authors = self.authors(comments.iter().map(|c| c.author_id)).await?;
        Ok(comments
            .into_iter()
            .map(|c| {
                let author = Self::author_of(&authors, c.author_id);
                Self::comment_response(c, author)
            })
            .collect())
    }

    pub async fn comment(&self, comment: Comment) -> DomainResult<CommentResponse> {
        let authors = self.authors([comment.author_id]).await?;
        let author = Self::author_of(&authors, comment.author_id);
        Ok(Self::comment_response(comment, author))
    }

    /// Project a post together with its comments, resolving every author at once.
    pub async fn post_detail(
        &self,
        post: Post,
        comments: Vec<Comment>,
    ) -> DomainResult<PostDetailResponse> {
        let authors = self
            .authors(
                std::iter::once(post.user_id).chain(comments.iter().map(|c| c.author_id)),
            )
            .await?;

        let post_author = Self::author_of(&authors, post.user_id);
        let comments = comments
            .into_iter()
            .map(|c| {
                let author = Self::author_of(&authors, c.author_id);
                Self::comment_response(c, author)
            })
            .collect();

        Ok(PostDetailResponse {
            post: Self::post_response(post, post_author),
            comments,
        })
    }
}

//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_shared::MessageResponse;
use quill_shared::dto::CreateCommentRequest;

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/comments/post/{post_id}
pub async fn list_for_post(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comments = state
        .comments
        .list_by_post(path.into_inner(), viewer.user_id())
        .await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// POST /api/comments/{post_id}
pub async fn create_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let comment = state
        .comments
        .create(post_id, &body.content, identity.user_id)
        .await?;

    tracing::info!(comment_id = %comment.id, post_id = %post_id, "Comment added");

    Ok(HttpResponse::Created().json(comment))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment_id = path.into_inner();
    state.comments.delete(comment_id, identity.user_id).await?;

    tracing::info!(comment_id = %comment_id, "Comment deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Comment removed")))
}

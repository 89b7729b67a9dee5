//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::PostStatus;
use quill_core::services::PostChanges;
use quill_shared::MessageResponse;
use quill_shared::dto::{CreatePostRequest, UpdatePostRequest};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/posts
pub async fn list_published(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_published().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/user
pub async fn list_mine(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let posts = state.posts.list_by_owner(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(path.into_inner(), viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let post = state
        .posts
        .create(&req.title, &req.content, identity.user_id)
        .await?;

    tracing::info!(post_id = %post.id, user_id = %identity.user_id, "Post created");

    Ok(HttpResponse::Created().json(post))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let status = req
        .status
        .as_deref()
        .map(str::parse::<PostStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let changes = PostChanges {
        title: req.title,
        content: req.content,
        status,
        tags: req.tags,
    };

    let post_id = path.into_inner();
    let post = state.posts.update(post_id, changes, identity.user_id).await?;

    tracing::info!(post_id = %post_id, "Post updated");

    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let removed = state.posts.delete(post_id, identity.user_id).await?;

    tracing::info!(post_id = %post_id, comments_removed = removed, "Post deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post removed")))
}

//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quill_core::DomainError;
use quill_core::domain::User;
use quill_core::services::IssuedToken;
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn auth_response(issued: IssuedToken) -> AuthResponse {
    AuthResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(issued.expires_in).unwrap_or(0),
    }
}

fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let issued = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await?;

    tracing::info!(user_id = %issued.user.id, "User registered");

    Ok(HttpResponse::Created().json(auth_response(issued)))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let issued = state
        .accounts
        .login(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            DomainError::Unauthorized => AppError::Unauthorized("Invalid credentials".to_string()),
            other => other.into(),
        })?;

    tracing::debug!(user_id = %issued.user.id, "User logged in");

    Ok(HttpResponse::Ok().json(auth_response(issued)))
}

/// GET /api/auth/user - the caller's own profile.
pub async fn current_user(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(user_response(user)))
}

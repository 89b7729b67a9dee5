//! End-to-end tests over the in-memory store.

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use serde_json::{Value, json};

use quill_core::ports::TokenService;
use quill_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

use crate::handlers;
use crate::middleware::auth::AUTH_TOKEN_HEADER;
use crate::state::{AppState, Repositories};

fn token_service() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JwtConfig {
        secret: "api-test-secret".into(),
        ..JwtConfig::default()
    }))
}

macro_rules! test_app {
    ($($extra:expr),* $(,)?) => {{
        let tokens = token_service();
        let state = AppState::new(
            Repositories::in_memory(),
            Arc::new(Argon2PasswordService::new()),
            tokens.clone(),
        );
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(tokens))
                $(.app_data($extra))*
                .configure(handlers::configure_routes),
        )
        .await
    }};
}

/// Register `$name` and return its token.
macro_rules! register {
    ($app:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": $name,
                "email": format!("{}@example.com", $name),
                "password": "password123",
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body["token"].as_str().unwrap().to_string()
    }};
}

/// Create a post as `$token` and return its JSON.
macro_rules! create_post {
    ($app:expr, $token:expr, $title:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((AUTH_TOKEN_HEADER, $token.as_str()))
            .set_json(json!({ "title": $title, "content": "Body text" }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

#[actix_web::test]
async fn test_health_check() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_register_then_fetch_profile() {
    let app = test_app!();
    let token = register!(app, "alice");

    let req = test::TestRequest::get()
        .uri("/api/auth/user")
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password_hash").is_none());

    // Bearer works as well.
    let req = test::TestRequest::get()
        .uri("/api/auth/user")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_auth_failures() {
    let app = test_app!();
    register!(app, "alice");

    let duplicate = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice2",
            "email": "alice@example.com",
            "password": "password123",
        }))
        .to_request();
    let resp = test::call_service(&app, duplicate).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, wrong_password).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Invalid credentials");

    let no_token = test::TestRequest::get().uri("/api/auth/user").to_request();
    let resp = test::call_service(&app, no_token).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let garbage = test::TestRequest::get()
        .uri("/api/auth/user")
        .insert_header((AUTH_TOKEN_HEADER, "not.a.token"))
        .to_request();
    let resp = test::call_service(&app, garbage).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"email\":")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
}

#[actix_web::test]
async fn test_post_lifecycle() {
    let app = test_app!();
    let token = register!(app, "alice");

    let anonymous = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "title": "Nope", "content": "x" }))
        .to_request();
    let resp = test::call_service(&app, anonymous).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let post = create_post!(app, token, "Hello, World!");
    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["author"]["username"], "alice");

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/posts/user")
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine[0]["id"], post["id"]);

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", post["id"].as_str().unwrap()))
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .set_json(json!({ "title": "Renamed", "content": "New body", "tags": ["rust"] }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["slug"], "renamed");
    assert_eq!(updated["tags"], json!(["rust"]));
}

#[actix_web::test]
async fn test_only_owner_may_mutate_post() {
    let app = test_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let post = create_post!(app, alice, "Mine");
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header((AUTH_TOKEN_HEADER, bob.as_str()))
        .set_json(json!({ "title": "Stolen", "content": "x" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "User not authorized");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((AUTH_TOKEN_HEADER, bob.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let unchanged: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unchanged["title"], "Mine");
}

#[actix_web::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let app = test_app!();
    let token = register!(app, "alice");

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/posts/not-a-uuid").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri("/api/comments/42")
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_drafts_are_visible_to_owner_only() {
    let app = test_app!();
    let token = register!(app, "alice");
    let post = create_post!(app, token, "Work in progress");
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .set_json(json!({ "title": "Work in progress", "content": "x", "status": "archived" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .set_json(json!({ "title": "Work in progress", "content": "x", "status": "draft" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((AUTH_TOKEN_HEADER, token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_comments_follow_their_post() {
    let app = test_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let post = create_post!(app, alice, "Discuss");
    let post_id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments/{post_id}"))
        .insert_header((AUTH_TOKEN_HEADER, bob.as_str()))
        .set_json(json!({ "content": "Nice post" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    assert_eq!(comment["author"]["username"], "bob");

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{post_id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["comments"][0]["id"], comment["id"]);

    // The post owner cannot remove someone else's comment.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/comments/{}", comment["id"].as_str().unwrap()))
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{post_id}"))
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Post removed");

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments/post/{post_id}"))
        .to_request();
    let comments: Value = test::call_and_read_body_json(&app, req).await;
    assert!(comments.as_array().unwrap().is_empty());

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments/{post_id}"))
        .insert_header((AUTH_TOKEN_HEADER, bob.as_str()))
        .set_json(json!({ "content": "Too late" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_auth_endpoints_are_rate_limited() {
    use quill_core::ports::RateLimiter;
    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: std::time::Duration::from_secs(60),
    }));
    let app = test_app!(web::Data::new(limiter));

    let login = || {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "x@example.com", "password": "password123" }))
            .to_request()
    };

    let first = test::call_service(&app, login()).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = test::call_service(&app, login()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));

    // Other routes are not limited.
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_draft_discussion_is_hidden_from_others() {
    let app = test_app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");
    let post = create_post!(app, alice, "Private notes");
    let post_id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{post_id}"))
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .set_json(json!({ "title": "Private notes", "content": "x", "status": "draft" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments/{post_id}"))
        .insert_header((AUTH_TOKEN_HEADER, bob.as_str()))
        .set_json(json!({ "content": "found it" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments/{post_id}"))
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .set_json(json!({ "content": "remember this" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments/post/{post_id}"))
        .to_request();
    let anonymous: Value = test::call_and_read_body_json(&app, req).await;
    assert!(anonymous.as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments/post/{post_id}"))
        .insert_header((AUTH_TOKEN_HEADER, alice.as_str()))
        .to_request();
    let owner: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(owner.as_array().unwrap().len(), 1);
}

#[cfg(feature = "rate-limit")]
fn one_request_limiter() -> web::Data<Arc<dyn quill_core::ports::RateLimiter>> {
    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let limiter: Arc<dyn quill_core::ports::RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: std::time::Duration::from_secs(60),
        }));
    web::Data::new(limiter)
}

#[cfg(feature = "rate-limit")]
fn login_from(peer: &str, forwarded_for: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth/login")
        .peer_addr(peer.parse().unwrap())
        .insert_header(("x-forwarded-for", forwarded_for))
        .set_json(json!({ "email": "x@example.com", "password": "password123" }))
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_forwarded_for_does_not_reset_rate_limit() {
    let app = test_app!(one_request_limiter());

    let first = login_from("203.0.113.7:40000", "1.1.1.1").to_request();
    let first = test::call_service(&app, first).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    for spoofed in ["2.2.2.2", "3.3.3.3", "4.4.4.4"] {
        let resp = login_from("203.0.113.7:40001", spoofed).to_request();
        let resp = test::call_service(&app, resp).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    // A different peer has its own budget.
    let other = login_from("198.51.100.2:40000", "1.1.1.1").to_request();
    let other = test::call_service(&app, other).await;
    assert_eq!(other.status(), StatusCode::UNAUTHORIZED);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_trusted_proxy_keys_on_forwarded_for() {
    use crate::middleware::rate_limit::TrustForwardedFor;

    let app = test_app!(one_request_limiter(), web::Data::new(TrustForwardedFor));
    let proxy = "10.0.0.1:8080";

    let first = login_from(proxy, "1.1.1.1").to_request();
    let first = test::call_service(&app, first).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = login_from(proxy, "2.2.2.2").to_request();
    let second = test::call_service(&app, second).await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);

    let repeat = login_from(proxy, "1.1.1.1").to_request();
    let repeat = test::call_service(&app, repeat).await;
    assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
}


//! HTTP client for the Quill API.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use quill_shared::ErrorResponse;
use quill_shared::dto::{
    AuthResponse, CommentResponse, CreateCommentRequest, CreatePostRequest, LoginRequest,
    PostDetailResponse, PostResponse, RegisterUserRequest, UpdatePostRequest, UserResponse,
};

use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Header carrying the identity token.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Typed client for one Quill server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Anonymous request.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Request carrying the session's token. Fails when nobody is signed in.
    fn authed(&self, method: Method, path: &str, session: &Session) -> ClientResult<RequestBuilder> {
        let token = session.token().ok_or(ClientError::NotSignedIn)?;
        Ok(self.request(method, path).header(AUTH_TOKEN_HEADER, token))
    }

    /// Request that carries the token only when there is one.
    fn maybe_authed(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        match session.token() {
            Some(token) => self.request(method, path).header(AUTH_TOKEN_HEADER, token),
            None => self.request(method, path),
        }
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let problem = response
            .json::<ErrorResponse>()
            .await
            .unwrap_or_else(|_| ErrorResponse::new(status.as_u16(), status.to_string()));

        tracing::debug!(status = problem.status, title = %problem.title, "API request failed");
        Err(ClientError::Api(problem))
    }

    /// Sign in with the issued token and fetch the profile into `session`.
    async fn start_session(&self, session: &mut Session, auth: AuthResponse) -> ClientResult<()> {
        session.load(auth);
        let user = self.current_user(session).await?;
        session.set_user(user);
        Ok(())
    }

    /// Create an account and sign in as it.
    pub async fn register(
        &self,
        session: &mut Session,
        request: &RegisterUserRequest,
    ) -> ClientResult<()> {
        let auth = Self::send(self.request(Method::POST, "/auth/register").json(request)).await?;
        self.start_session(session, auth).await
    }

    pub async fn login(&self, session: &mut Session, request: &LoginRequest) -> ClientResult<()> {
        let auth = Self::send(self.request(Method::POST, "/auth/login").json(request)).await?;
        self.start_session(session, auth).await
    }

    /// Sign out. Tokens are stateless, so this never talks to the server.
    pub fn logout(&self, session: &mut Session) {
        session.clear();
    }

    pub async fn current_user(&self, session: &Session) -> ClientResult<UserResponse> {
        Self::send(self.authed(Method::GET, "/auth/user", session)?).await
    }

    pub async fn published_posts(&self) -> ClientResult<Vec<PostResponse>> {
        Self::send(self.request(Method::GET, "/posts")).await
    }

    pub async fn my_posts(&self, session: &Session) -> ClientResult<Vec<PostResponse>> {
        Self::send(self.authed(Method::GET, "/posts/user", session)?).await
    }

    /// A post with its comments. Own drafts are visible when signed in.
    pub async fn post(&self, session: &Session, id: Uuid) -> ClientResult<PostDetailResponse> {
        Self::send(self.maybe_authed(Method::GET, &format!("/posts/{id}"), session)).await
    }

    pub async fn create_post(
        &self,
        session: &Session,
        request: &CreatePostRequest,
    ) -> ClientResult<PostResponse> {
        Self::send(self.authed(Method::POST, "/posts", session)?.json(request)).await
    }

    pub async fn update_post(
        &self,
        session: &Session,
        id: Uuid,
        request: &UpdatePostRequest,
    ) -> ClientResult<PostResponse> {
        let path = format!("/posts/{id}");
        Self::send(self.authed(Method::PUT, &path, session)?.json(request)).await
    }

    pub async fn delete_post(&self, session: &Session, id: Uuid) -> ClientResult<()> {
        let path = format!("/posts/{id}");
        Self::send::<serde_json::Value>(self.authed(Method::DELETE, &path, session)?).await?;
        Ok(())
    }

    /// Comments on a post. A draft's comments are only listed for its owner.
    pub async fn comments(
        &self,
        session: &Session,
        post_id: Uuid,
    ) -> ClientResult<Vec<CommentResponse>> {
        let path = format!("/comments/post/{post_id}");
        Self::send(self.maybe_authed(Method::GET, &path, session)).await
    }

    pub async fn add_comment(
        &self,
        session: &Session,
        post_id: Uuid,
        content: impl Into<String>,
    ) -> ClientResult<CommentResponse> {
        let path = format!("/comments/{post_id}");
        let body = CreateCommentRequest {
            content: content.into(),
        };
        Self::send(self.authed(Method::POST, &path, session)?.json(&body)).await
    }

    pub async fn delete_comment(&self, session: &Session, id: Uuid) -> ClientResult<()> {
        let path = format!("/comments/{id}");
        Self::send::<serde_json::Value>(self.authed(Method::DELETE, &path, session)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(token: &str) -> Session {
        let mut session = Session::new();
        session.load(AuthResponse {
            token: token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 60,
        });
        session
    }

    #[test]
    fn test_base_url_trailing_slash_is_ignored() {
        let client = ApiClient::new("http://localhost:5000/");
        let request = client.request(Method::GET, "/posts").build().unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:5000/api/posts");
    }

    #[test]
    fn test_authed_request_carries_token_header() {
        let client = ApiClient::new("http://localhost:5000");
        let session = signed_in("abc.def.ghi");

        let request = client
            .authed(Method::DELETE, "/comments/1", &session)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(request.headers()[AUTH_TOKEN_HEADER], "abc.def.ghi");
    }

    #[test]
    fn test_anonymous_session_cannot_build_authed_request() {
        let client = ApiClient::new("http://localhost:5000");

        let result = client.authed(Method::POST, "/posts", &Session::new());
        assert!(matches!(result, Err(ClientError::NotSignedIn)));
    }

    #[test]
    fn test_token_is_dropped_after_logout() {
        let client = ApiClient::new("http://localhost:5000");
        let mut session = signed_in("abc");

        let before = client
            .maybe_authed(Method::GET, "/posts/x", &session)
            .build()
            .unwrap();
        assert!(before.headers().contains_key(AUTH_TOKEN_HEADER));

        client.logout(&mut session);
        let after = client
            .maybe_authed(Method::GET, "/posts/x", &session)
            .build()
            .unwrap();
        assert!(!after.headers().contains_key(AUTH_TOKEN_HEADER));
    }
}

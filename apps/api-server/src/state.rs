//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{
    CommentRepository, PasswordService, PostRepository, TokenService, UserRepository,
};
use quill_core::projection::Projector;
use quill_core::services::{AccountService, CommentService, PostService};
use quill_infra::InMemoryDatabase;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub posts: PostService,
    pub comments: CommentService,
}

/// The three repository ports, backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    /// Process-local store. Data is lost on restart.
    pub fn in_memory() -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        Self {
            users: db.clone(),
            posts: db.clone(),
            comments: db,
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(
        config: &quill_infra::database::DatabaseConfig,
        run_migrations: bool,
    ) -> Result<Self, sea_orm_migration::sea_orm::DbErr> {
        use quill_infra::database::{
            PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository, connect,
        };
        use sea_orm_migration::MigratorTrait;

        let conn = connect(config).await?;

        if run_migrations {
            tracing::info!("Applying pending migrations");
            migration::Migrator::up(&conn, None).await?;
        }

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            comments: Arc::new(PostgresCommentRepository::new(conn)),
        })
    }

    /// Pick the store from configuration.
    ///
    /// Without `DATABASE_URL` the server runs on the in-memory store. A configured
    /// database that cannot be reached is a startup error.
    pub async fn from_config(config: &AppConfig) -> std::io::Result<Self> {
        match &config.database {
            #[cfg(feature = "postgres")]
            Some(db_config) => Self::postgres(db_config, config.run_migrations)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to connect to database");
                    std::io::Error::other(e.to_string())
                }),
            #[cfg(not(feature = "postgres"))]
            Some(_) => {
                tracing::warn!(
                    "DATABASE_URL is set but the postgres feature is disabled. Using in-memory store."
                );
                Ok(Self::in_memory())
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Ok(Self::in_memory())
            }
        }
    }
}

impl AppState {
    /// Wire the services over the given repositories.
    pub fn new(
        repos: Repositories,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let projector = Projector::new(repos.users.clone());
        let posts = PostService::new(repos.posts, repos.comments.clone(), projector.clone());
        let comments = CommentService::new(repos.comments, posts.clone(), projector);
        let accounts = AccountService::new(repos.users, passwords, tokens);

        tracing::info!("Application state initialized");

        Self {
            accounts,
            posts,
            comments,
        }
    }
}

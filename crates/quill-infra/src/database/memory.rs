//! In-memory store - used when no database is configured, and in tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Comment, Post, User};
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, CommentRepository, PostRepository, UserRepository,
};
use quill_core::projection::sort_newest_first;

/// One process-local store implementing every repository port.
///
/// Integrity rules mirror the Postgres schema for the paths the services use:
/// username and email are unique, a comment must reference an existing post and an
/// existing author, deleting a post removes its comments, and deleting a user removes
/// their posts and comments. Post owners are not checked on insert. Data is lost on
/// process restart.
///
/// Lock order is always users, posts, comments.
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<Vec<User>>,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn upsert<T>(rows: &mut Vec<T>, entity: T, same: impl Fn(&T) -> bool) {
    match rows.iter_mut().find(|row| same(row)) {
        Some(row) => *row = entity,
        None => rows.push(entity),
    }
}

fn remove<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> Result<(), RepoError> {
    let before = rows.len();
    rows.retain(|row| !matches(row));
    if rows.len() == before {
        Err(RepoError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;

        let clash = users
            .iter()
            .any(|u| u.id != user.id && (u.email == user.email || u.username == user.username));
        if clash {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        upsert(&mut users, user.clone(), |u| u.id == user.id);
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let mut posts = self.posts.write().await;
        let mut comments = self.comments.write().await;

        remove(&mut users, |u| u.id == id)?;

        let owned: Vec<Uuid> = posts.iter().filter(|p| p.user_id == id).map(|p| p.id).collect();
        posts.retain(|p| p.user_id != id);
        comments.retain(|c| c.author_id != id && !owned.contains(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        upsert(&mut *self.posts.write().await, post.clone(), |p| p.id == post.id);
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.delete_with_comments(id).await.map(|_| ())
    }
}

#[async_trait]
impl PostRepository for InMemoryDatabase {
    async fn find_published(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.is_published())
            .cloned()
            .collect();
        sort_newest_first(&mut posts, |p| (p.created_at, p.id));
        Ok(posts)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut posts, |p| (p.created_at, p.id));
        Ok(posts)
    }

    async fn delete_with_comments(&self, id: Uuid) -> Result<u64, RepoError> {
        let mut posts = self.posts.write().await;
        let mut comments = self.comments.write().await;

        remove(&mut posts, |p| p.id == id)?;

        let before = comments.len();
        comments.retain(|c| c.post_id != id);
        Ok((before - comments.len()) as u64)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        // Hold both read locks so neither referent can vanish between check and insert.
        let users = self.users.read().await;
        let posts = self.posts.read().await;
        let references_exist = posts.iter().any(|p| p.id == comment.post_id)
            && users.iter().any(|u| u.id == comment.author_id);
        if !references_exist {
            return Err(RepoError::Constraint(
                "Referenced entity does not exist".to_string(),
            ));
        }

        upsert(&mut *self.comments.write().await, comment.clone(), |c| {
            c.id == comment.id
        });
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        remove(&mut *self.comments.write().await, |c| c.id == id)
    }
}

#[async_trait]
impl CommentRepository for InMemoryDatabase {
    async fn find_by_post_id(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        sort_newest_first(&mut comments, |c| (c.created_at, c.id));
        Ok(comments)
    }
}

//! Domain entities - the core business objects.

mod comment;
mod post;
mod user;

pub use comment::Comment;
pub use post::{Post, PostStatus, normalize_tags, slugify};
pub use user::User;

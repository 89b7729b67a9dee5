use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    #[default]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status '{other}'")),
        }
    }
}

/// Post entity - a blog article owned by the user who wrote it.
///
/// The post's comments are not stored on the post. They are whatever comments
/// reference `id`, looked up on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new published post with no tags.
    pub fn new(user_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            slug: slugify(&title),
            title,
            content,
            status: PostStatus::Published,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace title and content, re-deriving the slug.
    pub fn rewrite(&mut self, title: String, content: String) {
        self.slug = slugify(&title);
        self.title = title;
        self.content = content;
        self.updated_at = Utc::now();
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Derive a URL slug from a title.
///
/// ASCII alphanumerics are kept (lowercased); every run of anything else becomes a
/// single `-`. Leading and trailing separators are dropped, so the output is a fixed
/// point: `slugify(&slugify(t)) == slugify(t)`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut separator_pending = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if separator_pending && !slug.is_empty() {
                slug.push('-');
            }
            separator_pending = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            separator_pending = true;
        }
    }

    slug
}

/// Normalize a tag set: trimmed, lowercased, empty entries dropped, first occurrence wins.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

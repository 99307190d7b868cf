//! Read models shaped for callers. Authors are denormalized so a caller
//! never has to fetch users separately.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::post::{MediaRef, Post};

/// Public author fields attached to posts, likes and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    /// `None` when the author record no longer resolves.
    pub author: Option<AuthorSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Option<AuthorSummary>,
    pub media: Vec<MediaRef>,
    pub likes_count: usize,
    pub comments_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostSummary {
    pub fn new(post: Post, author: Option<AuthorSummary>) -> Self {
        Self {
            id: post.id,
            likes_count: post.likes.len(),
            comments_count: post.comments.len(),
            title: post.title,
            content: post.content,
            author,
            media: post.media,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub summary: PostSummary,
    pub likes: Vec<AuthorSummary>,
    pub comments: Vec<CommentView>,
    /// Whether the caller is in the liker set. Always false when anonymous.
    pub user_liked: bool,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub likes_count: usize,
    pub user_liked: bool,
}

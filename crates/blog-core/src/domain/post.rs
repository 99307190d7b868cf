use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to an uploaded file held by the media store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub key: String,
}

/// Comment embedded in a post. It has no lifecycle of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            author_id,
            created_at: Utc::now(),
        }
    }
}

/// Post entity - the aggregate root owning its comments, likes and media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    /// Author.
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub media: Vec<MediaRef>,
    /// Liker set. Each user id appears at most once.
    pub likes: Vec<Uuid>,
    /// Insertion order is display order.
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    pub fn new(user_id: Uuid, title: String, content: String, media: Vec<MediaRef>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            content,
            media,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }

    /// Flip the user's membership in the liker set and return the resulting
    /// membership.
    pub fn toggle_like(&mut self, user_id: Uuid) -> bool {
        if self.liked_by(user_id) {
            self.likes.retain(|id| *id != user_id);
            false
        } else {
            self.likes.push(user_id);
            true
        }
    }

    /// Comments are append-only; `updated_at` is left alone.
    pub fn append_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Replace the editable fields. Media is kept when `media` is `None`.
    pub fn apply_edit(&mut self, title: String, content: String, media: Option<Vec<MediaRef>>) {
        self.title = title;
        self.content = content;
        if let Some(media) = media {
            self.media = media;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(
            Uuid::new_v4(),
            "Hello".to_string(),
            "World".to_string(),
            vec![],
        )
    }

    #[test]
    fn test_toggle_like_parity() {
        let mut post = post();
        let user = Uuid::new_v4();

        for n in 1..=7 {
            let liked = post.toggle_like(user);
            assert_eq!(liked, n % 2 == 1);
            assert_eq!(post.liked_by(user), n % 2 == 1);
        }
    }

    #[test]
    fn test_toggle_like_keeps_other_likers() {
        let mut post = post();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();

        post.toggle_like(bob);
        post.toggle_like(carol);
        post.toggle_like(bob);

        assert_eq!(post.likes, vec![carol]);
    }

    #[test]
    fn test_unlike_heals_duplicate_entries() {
        let mut post = post();
        let bob = Uuid::new_v4();
        post.likes = vec![bob, bob];

        assert!(!post.toggle_like(bob));
        assert!(post.likes.is_empty());
    }

    #[test]
    fn test_comments_keep_append_order() {
        let mut post = post();
        let author = Uuid::new_v4();

        for text in ["first", "second", "third"] {
            post.append_comment(Comment::new(author, text.to_string()));
        }

        let contents: Vec<_> = post.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_apply_edit_keeps_media_when_absent() {
        let mut post = post();
        post.media = vec![MediaRef {
            url: "http://cdn/a.png".to_string(),
            key: "attachments/a.png".to_string(),
        }];

        post.apply_edit("New".to_string(), "Body".to_string(), None);

        assert_eq!(post.title, "New");
        assert_eq!(post.media.len(), 1);
    }
}

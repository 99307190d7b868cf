use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Comment, LikeOutcome, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
///
/// `update` replaces every stored field of the entity in one write, with no
/// version check. Mutations that must not lose concurrent writes have their
/// own atomic methods on the entity repositories.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique collisions surface as `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Replace an existing entity. `RepoError::NotFound` when it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Batch lookup used to denormalize authors. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError>;

    /// Set a new password hash and burn the reset token in one conditional
    /// write. Returns `false` when no user holds `token` with an expiry after
    /// `now`, including when a concurrent call already consumed it.
    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, RepoError>;

    /// Mark the holder of `token` verified and burn the token in one
    /// conditional write. `None` when no user holds it.
    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepoError>;

    /// Clear reset tokens whose expiry is at or before `now`. Returns the
    /// number of users touched.
    async fn clear_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, newest first.
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError>;

    /// Posts by one author, newest first.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Write title, content, media and `updated_at` only. Likes and comments
    /// stored meanwhile are kept; the returned post reflects them.
    async fn update_content(&self, post: Post) -> Result<Post, RepoError>;

    /// Flip `user_id` in the liker set as one atomic step. Toggles by
    /// different users never overwrite each other. `None` when the post does
    /// not exist.
    async fn toggle_like(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LikeOutcome>, RepoError>;

    /// Append to the post's comments as one atomic step.
    /// `RepoError::NotFound` when the post does not exist.
    async fn append_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError>;
}

//! In-memory repositories - used when no database is configured and in tests.
//!
//! Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Comment, LikeOutcome, Post, User};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, UserRepository};

/// In-memory user store with the same unique constraints as the `users` table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(store: &HashMap<Uuid, User>, user: &User) -> Result<(), RepoError> {
        for other in store.values().filter(|u| u.id != user.id) {
            if other.email == user.email {
                return Err(RepoError::Constraint("duplicate email".to_string()));
            }
            if user.username.is_some() && other.username == user.username {
                return Err(RepoError::Constraint("duplicate username".to_string()));
            }
        }
        Ok(())
    }

    async fn find_where(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        let store = self.store.read().await;
        store.values().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&user.id) {
            return Err(RepoError::Constraint("duplicate id".to_string()));
        }
        Self::check_unique(&store, &user)?;
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if !store.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        Self::check_unique(&store, &user)?;
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.find_where(|u| u.email == email).await)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .find_where(|u| u.username.as_deref() == Some(username))
            .await)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .find_where(|u| u.reset_token.as_deref() == Some(token))
            .await)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, RepoError> {
        let mut store = self.store.write().await;
        match store
            .values_mut()
            .find(|u| u.reset_token_usable(token, now))
        {
            Some(user) => {
                user.complete_password_reset(password_hash.to_string(), now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store
            .values_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
            .map(|user| {
                user.mark_email_verified(now);
                user.clone()
            }))
    }

    async fn clear_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let mut cleared = 0;
        for user in store.values_mut() {
            if user.reset_token_expiry.is_some_and(|expiry| expiry <= now) {
                user.reset_token = None;
                user.reset_token_expiry = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

/// In-memory post store. Like and comment mutations run under the write
/// guard, so each is atomic with respect to every other write.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_newest_first(&self, pred: impl Fn(&Post) -> bool) -> Vec<Post> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store.values().filter(|p| pred(p)).cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&post.id) {
            return Err(RepoError::Constraint("duplicate id".to_string()));
        }
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        match store.get_mut(&post.id) {
            Some(existing) => {
                *existing = post.clone();
                Ok(post)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.collect_newest_first(|_| true).await)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        Ok(self.collect_newest_first(|p| p.user_id == user_id).await)
    }

    async fn update_content(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        let existing = store.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        existing.title = post.title;
        existing.content = post.content;
        existing.media = post.media;
        existing.updated_at = post.updated_at;
        Ok(existing.clone())
    }

    async fn toggle_like(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LikeOutcome>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.get_mut(&post_id).map(|post| {
            let user_liked = post.toggle_like(user_id);
            LikeOutcome {
                likes_count: post.likes.len(),
                user_liked,
            }
        }))
    }

    async fn append_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        let post = store.get_mut(&post_id).ok_or(RepoError::NotFound)?;
        post.append_comment(comment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[tokio::test]
    async fn test_user_unique_email_and_username() {
        let repo = InMemoryUserRepository::new();
        repo.insert(User::new(
            "alice@example.com".to_string(),
            Some("alice".to_string()),
            None,
        ))
        .await
        .unwrap();

        let same_email = User::new("alice@example.com".to_string(), None, None);
        assert!(matches!(
            repo.insert(same_email).await,
            Err(RepoError::Constraint(_))
        ));

        let same_username = User::new(
            "other@example.com".to_string(),
            Some("alice".to_string()),
            None,
        );
        assert!(matches!(
            repo.insert(same_username).await,
            Err(RepoError::Constraint(_))
        ));

        // Users without a username never collide on it.
        repo.insert(User::new("a@example.com".to_string(), None, None))
            .await
            .unwrap();
        repo.insert(User::new("b@example.com".to_string(), None, None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let repo = InMemoryUserRepository::new();
        let ghost = User::new("ghost@example.com".to_string(), None, None);
        assert!(matches!(repo.update(ghost).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_clear_expired_reset_tokens() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();

        let mut stale = User::new("stale@example.com".to_string(), None, None);
        stale.issue_reset_token("old".to_string(), TimeDelta::hours(1), now - TimeDelta::hours(2));
        let mut fresh = User::new("fresh@example.com".to_string(), None, None);
        fresh.issue_reset_token("new".to_string(), TimeDelta::hours(1), now);
        repo.insert(stale.clone()).await.unwrap();
        repo.insert(fresh.clone()).await.unwrap();

        assert_eq!(repo.clear_expired_reset_tokens(now).await.unwrap(), 1);
        assert!(repo.find_by_reset_token("old").await.unwrap().is_none());
        assert!(repo.find_by_reset_token("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_posts_listed_newest_first() {
        let repo = InMemoryPostRepository::new();
        let author = Uuid::new_v4();

        let mut older = Post::new(author, "Older".to_string(), "a".to_string(), vec![]);
        older.created_at = Utc::now() - TimeDelta::minutes(5);
        let newer = Post::new(author, "Newer".to_string(), "b".to_string(), vec![]);
        let other = Post::new(Uuid::new_v4(), "Other".to_string(), "c".to_string(), vec![]);
        repo.insert(older).await.unwrap();
        repo.insert(newer).await.unwrap();
        repo.insert(other).await.unwrap();

        let all = repo.list_recent().await.unwrap();
        assert_eq!(all.len(), 3);

        let mine: Vec<String> = repo
            .find_by_user_id(author)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(mine, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_consume_reset_token_once() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        let mut user = User::new("alice@example.com".to_string(), None, None);
        user.issue_reset_token("tok".to_string(), TimeDelta::hours(1), now);
        repo.insert(user.clone()).await.unwrap();

        assert!(repo.consume_reset_token("tok", now, "h1").await.unwrap());
        assert!(!repo.consume_reset_token("tok", now, "h2").await.unwrap());

        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash.as_deref(), Some("h1"));
        assert!(stored.reset_token.is_none());
    }

    #[tokio::test]
    async fn test_consume_reset_token_rejects_expired() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        let mut user = User::new("alice@example.com".to_string(), None, None);
        user.issue_reset_token("tok".to_string(), TimeDelta::hours(1), now);
        repo.insert(user).await.unwrap();

        let later = now + TimeDelta::hours(1);
        assert!(!repo.consume_reset_token("tok", later, "h").await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_verification_token_once() {
        let repo = InMemoryUserRepository::new();
        let mut user = User::new("alice@example.com".to_string(), None, None);
        user.verification_token = Some("verify".to_string());
        repo.insert(user).await.unwrap();

        let verified = repo
            .consume_verification_token("verify", Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(verified.email_verified);
        assert!(verified.verification_token.is_none());
        assert!(
            repo.consume_verification_token("verify", Utc::now())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_content_keeps_likes_and_comments() {
        let repo = InMemoryPostRepository::new();
        let post = repo
            .insert(Post::new(Uuid::new_v4(), "t".to_string(), "c".to_string(), vec![]))
            .await
            .unwrap();
        let mut edited = post.clone();
        let bob = Uuid::new_v4();

        repo.toggle_like(post.id, bob).await.unwrap();
        repo.append_comment(post.id, Comment::new(bob, "hi".to_string()))
            .await
            .unwrap();
        edited.apply_edit("New".to_string(), "Body".to_string(), None);
        let stored = repo.update_content(edited).await.unwrap();

        assert_eq!(stored.title, "New");
        assert_eq!(stored.likes, vec![bob]);
        assert_eq!(stored.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_like_and_comment_on_missing_post() {
        let repo = InMemoryPostRepository::new();
        let id = Uuid::new_v4();

        assert!(repo.toggle_like(id, Uuid::new_v4()).await.unwrap().is_none());
        assert!(matches!(
            repo.append_comment(id, Comment::new(Uuid::new_v4(), "x".to_string()))
                .await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_post_twice() {
        let repo = InMemoryPostRepository::new();
        let post = repo
            .insert(Post::new(Uuid::new_v4(), "t".to_string(), "c".to_string(), vec![]))
            .await
            .unwrap();

        repo.delete(post.id).await.unwrap();
        assert!(matches!(repo.delete(post.id).await, Err(RepoError::NotFound)));
    }
}

//! Post mutations and reads: the aggregate-root operations.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    AuthorSummary, Comment, CommentView, LikeOutcome, MediaRef, Post, PostDetail, PostSummary,
    Session,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, UserRepository};

/// Title, content and optional media list for create and update.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub media: Option<Vec<MediaRef>>,
}

impl PostDraft {
    fn validated(self) -> Result<(String, String, Option<Vec<MediaRef>>), DomainError> {
        let title = self.title.trim();
        if title.is_empty() || self.content.trim().is_empty() {
            return Err(DomainError::Validation(
                "Title and content are required".to_string(),
            ));
        }
        Ok((title.to_string(), self.content, self.media))
    }
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    /// All posts, newest first.
    pub async fn list(&self) -> Result<Vec<PostSummary>, DomainError> {
        let posts = self.posts.list_recent().await?;
        self.summarize(posts).await
    }

    /// Posts authored by the caller.
    pub async fn list_own(&self, session: &Session) -> Result<Vec<PostSummary>, DomainError> {
        let identity = session.require()?;
        let posts = self.posts.find_by_user_id(identity.user_id).await?;
        self.summarize(posts).await
    }

    pub async fn get(&self, id: Uuid, session: &Session) -> Result<PostDetail, DomainError> {
        let post = self.load(id).await?;

        let involved = iter::once(post.user_id)
            .chain(post.likes.iter().copied())
            .chain(post.comments.iter().map(|c| c.author_id));
        let authors = self.authors(involved).await?;

        let user_liked = session
            .user_id()
            .is_some_and(|user_id| post.liked_by(user_id));
        let likes = post
            .likes
            .iter()
            .filter_map(|id| authors.get(id).cloned())
            .collect();
        let comments = comment_views(&post.comments, &authors);
        let author = authors.get(&post.user_id).cloned();

        Ok(PostDetail {
            summary: PostSummary::new(post, author),
            likes,
            comments,
            user_liked,
        })
    }

    pub async fn create(&self, session: &Session, draft: PostDraft) -> Result<Post, DomainError> {
        let identity = session.require()?;
        let (title, content, media) = draft.validated()?;

        let post = Post::new(identity.user_id, title, content, media.unwrap_or_default());
        Ok(self.posts.insert(post).await?)
    }

    /// Edit title, content and media. Likes and comments are not written, so
    /// they survive a concurrent edit; two concurrent edits race last-write-wins.
    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let identity = session.require()?;
        let mut post = self.load(id).await?;
        if !post.is_authored_by(identity.user_id) {
            return Err(DomainError::Forbidden);
        }

        let (title, content, media) = draft.validated()?;
        post.apply_edit(title, content, media);
        self.posts
            .update_content(post)
            .await
            .map_err(|e| not_found_as(e, id))
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<(), DomainError> {
        let identity = session.require()?;
        let post = self.load(id).await?;
        if !post.is_authored_by(identity.user_id) {
            return Err(DomainError::Forbidden);
        }

        self.posts.delete(id).await.map_err(|e| not_found_as(e, id))
    }

    /// Flip the caller's like on a post.
    ///
    /// The membership test and the write happen in one store operation, so
    /// concurrent toggles by different users are all kept. Two racing
    /// toggles by the same user resolve to the last one applied.
    pub async fn toggle_like(&self, session: &Session, id: Uuid) -> Result<LikeOutcome, DomainError> {
        let identity = session.require()?;
        self.posts
            .toggle_like(id, identity.user_id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    /// Append a comment. The author fields come from the session claims so
    /// the caller does not need to re-fetch.
    pub async fn add_comment(
        &self,
        session: &Session,
        id: Uuid,
        text: &str,
    ) -> Result<CommentView, DomainError> {
        let identity = session.require()?;
        let content = text.trim();
        if content.is_empty() {
            return Err(DomainError::Validation(
                "Comment content is required".to_string(),
            ));
        }

        let comment = Comment::new(identity.user_id, content.to_string());
        self.posts
            .append_comment(id, comment.clone())
            .await
            .map_err(|e| not_found_as(e, id))?;

        Ok(CommentView {
            id: comment.id,
            content: comment.content,
            author: Some(AuthorSummary {
                id: identity.user_id,
                email: identity.email.clone(),
                username: identity.username.clone(),
            }),
            created_at: comment.created_at,
        })
    }

    /// Comments in append order with authors resolved from the store.
    pub async fn comments(&self, id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let post = self.load(id).await?;
        let authors = self
            .authors(post.comments.iter().map(|c| c.author_id))
            .await?;
        Ok(comment_views(&post.comments, &authors))
    }

    async fn load(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    async fn summarize(&self, posts: Vec<Post>) -> Result<Vec<PostSummary>, DomainError> {
        let authors = self.authors(posts.iter().map(|p| p.user_id)).await?;
        Ok(posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.user_id).cloned();
                PostSummary::new(post, author)
            })
            .collect())
    }

    async fn authors(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, AuthorSummary>, DomainError> {
        let mut ids: Vec<Uuid> = ids.collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = self.users.find_by_ids(&ids).await?;
        Ok(users.iter().map(|u| (u.id, u.summary())).collect())
    }
}

fn comment_views(comments: &[Comment], authors: &HashMap<Uuid, AuthorSummary>) -> Vec<CommentView> {
    comments
        .iter()
        .map(|c| CommentView {
            id: c.id,
            content: c.content.clone(),
            author: authors.get(&c.author_id).cloned(),
            created_at: c.created_at,
        })
        .collect()
}

fn not_found_as(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::post_not_found(id),
        other => other.into(),
    }
}

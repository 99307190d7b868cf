//! Domain values shaped into wire DTOs.

use blog_core::domain::{
    AuthorSummary, CommentView, Identity, MediaRef, Post, PostDetail, PostSummary, User,
};
use blog_core::ports::IssuedToken;
use blog_shared::dto::{
    AuthResponse, AuthorDto, CommentResponse, MediaDto, PostDetailResponse, PostResponse,
    PostSummaryResponse, SessionUser, UserResponse,
};

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        name: user.name.clone(),
        bio: user.bio.clone(),
        image: user.image.clone(),
        email_verified: user.email_verified,
        created_at: user.created_at,
    }
}

pub fn auth(issued: &IssuedToken, account: &User) -> AuthResponse {
    AuthResponse {
        access_token: issued.token.clone(),
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
        user: user(account),
    }
}

pub fn session_user(identity: &Identity) -> SessionUser {
    SessionUser {
        id: identity.user_id,
        email: identity.email.clone(),
        username: identity.username.clone(),
        name: identity.name.clone(),
        image: identity.image.clone(),
    }
}

pub fn author(summary: AuthorSummary) -> AuthorDto {
    AuthorDto {
        id: summary.id,
        email: summary.email,
        username: summary.username,
    }
}

pub fn media(media: MediaRef) -> MediaDto {
    MediaDto {
        url: media.url,
        key: media.key,
    }
}

pub fn media_ref(dto: MediaDto) -> MediaRef {
    MediaRef {
        url: dto.url,
        key: dto.key,
    }
}

pub fn post(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.user_id,
        likes_count: post.likes.len(),
        comments_count: post.comments.len(),
        title: post.title,
        content: post.content,
        media: post.media.into_iter().map(media).collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn summary(summary: PostSummary) -> PostSummaryResponse {
    PostSummaryResponse {
        id: summary.id,
        title: summary.title,
        content: summary.content,
        author: summary.author.map(author),
        media: summary.media.into_iter().map(media).collect(),
        likes_count: summary.likes_count,
        comments_count: summary.comments_count,
        created_at: summary.created_at,
        updated_at: summary.updated_at,
    }
}

pub fn detail(detail: PostDetail) -> PostDetailResponse {
    PostDetailResponse {
        post: summary(detail.summary),
        likes: detail.likes.into_iter().map(author).collect(),
        comments: detail.comments.into_iter().map(comment).collect(),
        user_liked: detail.user_liked,
    }
}

pub fn comment(view: CommentView) -> CommentResponse {
    CommentResponse {
        id: view.id,
        content: view.content,
        author: view.author.map(author),
        created_at: view.created_at,
    }
}

//! Blog post handlers: CRUD, likes and comments.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blog_core::services::PostDraft;
use blog_shared::dto::{CommentRequest, LikeResponse, MessageResponse, PostRequest};

use super::present;
use crate::middleware::error::AppResult;
use crate::middleware::session::CurrentSession;
use crate::state::AppState;

fn draft(body: PostRequest) -> PostDraft {
    PostDraft {
        title: body.title,
        content: body.content,
        media: body
            .media
            .map(|list| list.into_iter().map(present::media_ref).collect()),
    }
}

/// GET /api/blogs
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list().await?;
    let body: Vec<_> = posts.into_iter().map(present::summary).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/blogs
pub async fn create(
    state: web::Data<AppState>,
    current: CurrentSession,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .create(&current.session, draft(body.into_inner()))
        .await?;

    tracing::info!(post_id = %post.id, author_id = %post.user_id, "Post created");
    Ok(HttpResponse::Created().json(present::post(post)))
}

/// GET /api/blogs/{id}
pub async fn get(
    state: web::Data<AppState>,
    current: CurrentSession,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state.posts.get(path.into_inner(), &current.session).await?;
    Ok(HttpResponse::Ok().json(present::detail(detail)))
}

/// PUT /api/blogs/{id}
pub async fn update(
    state: web::Data<AppState>,
    current: CurrentSession,
    path: web::Path<Uuid>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update(&current.session, path.into_inner(), draft(body.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(present::post(post)))
}

/// DELETE /api/blogs/{id}
pub async fn delete(
    state: web::Data<AppState>,
    current: CurrentSession,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.posts.delete(&current.session, id).await?;

    tracing::info!(post_id = %id, "Post deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// POST /api/blogs/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    current: CurrentSession,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .posts
        .toggle_like(&current.session, path.into_inner())
        .await?;

    let message = if outcome.user_liked {
        "Post liked"
    } else {
        "Post unliked"
    };
    Ok(HttpResponse::Ok().json(LikeResponse {
        likes_count: outcome.likes_count,
        user_liked: outcome.user_liked,
        message: message.to_string(),
    }))
}

/// POST /api/blogs/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    current: CurrentSession,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let view = state
        .posts
        .add_comment(&current.session, path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Ok().json(present::comment(view)))
}

/// GET /api/blogs/{id}/comments
pub async fn comments(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let views = state.posts.comments(path.into_inner()).await?;
    let body: Vec<_> = views.into_iter().map(present::comment).collect();
    Ok(HttpResponse::Ok().json(body))
}

//! Handlers for the signed-in user's own profile, posts and avatar.

use actix_web::{HttpRequest, HttpResponse, web};

use blog_core::domain::User;
use blog_core::services::ProfileUpdate;
use blog_shared::dto::{AvatarResponse, ProfileUpdateRequest, UploadQuery};

use super::present;
use super::uploads::read_upload;
use crate::middleware::error::AppResult;
use crate::middleware::session::{CurrentSession, session_cookie};
use crate::state::AppState;

/// Re-sign the caller's token with the stored profile and attach it.
fn with_refreshed_cookie(
    state: &AppState,
    current: &CurrentSession,
    user: &User,
    mut response: actix_web::HttpResponseBuilder,
) -> AppResult<actix_web::HttpResponseBuilder> {
    let issued = state.sessions.sync_profile(current.token()?, user)?;
    response.cookie(session_cookie(&issued, state.cookie_secure));
    Ok(response)
}

/// GET /api/user/profile
pub async fn profile(
    state: web::Data<AppState>,
    current: CurrentSession,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(&current.session).await?;
    Ok(HttpResponse::Ok().json(present::user(&user)))
}

/// PUT /api/user/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    current: CurrentSession,
    body: web::Json<ProfileUpdateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .accounts
        .update_profile(
            &current.session,
            ProfileUpdate {
                username: req.username,
                name: req.name,
                bio: req.bio,
                image: req.image,
            },
        )
        .await?;

    let mut response = with_refreshed_cookie(&state, &current, &user, HttpResponse::Ok())?;
    Ok(response.json(present::user(&user)))
}

/// GET /api/user/posts
pub async fn posts(
    state: web::Data<AppState>,
    current: CurrentSession,
) -> AppResult<HttpResponse> {
    let posts = state.posts.list_own(&current.session).await?;
    let body: Vec<_> = posts.into_iter().map(present::summary).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/user/upload-image
pub async fn upload_image(
    state: web::Data<AppState>,
    current: CurrentSession,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    current.session.require()?;
    let upload = read_upload(&req, query.into_inner(), payload, state.max_upload_bytes).await?;

    let user = state.accounts.update_avatar(&current.session, upload).await?;
    let image_url = user.image.clone().unwrap_or_default();

    let mut response = with_refreshed_cookie(&state, &current, &user, HttpResponse::Ok())?;
    Ok(response.json(AvatarResponse {
        image_url,
        message: "Profile photo updated".to_string(),
    }))
}

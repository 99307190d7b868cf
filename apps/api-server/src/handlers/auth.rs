//! Sign-in, sign-out and session handlers.

use actix_web::{HttpResponse, web};

use blog_core::ports::ClaimsUpdate;
use blog_shared::dto::{LoginRequest, MessageResponse, SessionResponse, SessionUpdateRequest};

use super::present;
use crate::middleware::error::AppResult;
use crate::middleware::session::{CurrentSession, removal_cookie, session_cookie};
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state.accounts.authenticate(&req.email, &req.password).await?;
    let issued = state.sessions.issue(&user)?;

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&issued, state.cookie_secure))
        .json(present::auth(&issued, &user)))
}

/// POST /api/auth/logout
///
/// Tokens are stateless, so this only clears the cookie.
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(state.cookie_secure))
        .json(MessageResponse::new("Signed out"))
}

/// GET /api/auth/session
pub async fn session(current: CurrentSession) -> HttpResponse {
    let body = match current.identity() {
        Some(identity) => SessionResponse {
            user: Some(present::session_user(identity)),
            expires: Some(identity.expires_at),
        },
        None => SessionResponse {
            user: None,
            expires: None,
        },
    };

    HttpResponse::Ok().json(body)
}

/// POST /api/auth/session
///
/// Merges caller-supplied profile fields into the session token. Every
/// supplied value must match the stored profile.
pub async fn update_session(
    state: web::Data<AppState>,
    current: CurrentSession,
    body: web::Json<SessionUpdateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let stored = state.accounts.profile(&current.session).await?;
    let token = current.token()?;

    let update = ClaimsUpdate {
        email: req.email,
        username: req.username.map(Some),
        name: req.name.map(Some),
        image: req.image.map(Some),
    };
    let issued = state.sessions.refresh(token, update, &stored)?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&issued, state.cookie_secure))
        .json(present::auth(&issued, &stored)))
}

//! Session extractor and cookie helpers.

use std::future::{Ready, ready};

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use chrono::Utc;

use blog_core::domain::{Identity, Session};
use blog_core::ports::IssuedToken;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "blog_session";

/// The caller's session, resolved once per request.
///
/// A missing, malformed, expired or wrongly signed token resolves to
/// `Session::Anonymous`. Handlers never see a partial identity.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session: Session,
    /// The raw token, kept only when it verified.
    token: Option<String>,
}

impl CurrentSession {
    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    /// The verified token, or `Unauthorized`.
    pub fn token(&self) -> Result<&str, AppError> {
        self.token.as_deref().ok_or(AppError::Unauthorized)
    }
}

/// Bearer header first, then the session cookie.
fn presented_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer
        .map(String::from)
        .or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
        .filter(|token| !token.is_empty())
}

impl FromRequest for CurrentSession {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState not found in app data");
            return ready(Err(AppError::Internal(
                "Server configuration error".to_string(),
            )));
        };

        let token = presented_token(req);
        let current = match state.sessions.resolve(token.as_deref()) {
            Ok(session) => CurrentSession {
                token: token.filter(|_| matches!(session, Session::Authenticated(_))),
                session,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token, continuing anonymously");
                CurrentSession {
                    session: Session::Anonymous,
                    token: None,
                }
            }
        };

        ready(Ok(current))
    }
}

/// Cookie carrying `issued`, living until the token expires.
pub fn session_cookie(issued: &IssuedToken, secure: bool) -> Cookie<'static> {
    let remaining = (issued.expires_at - Utc::now()).num_seconds().max(0);

    Cookie::build(SESSION_COOKIE, issued.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(remaining))
        .finish()
}

/// Cookie that makes the browser drop the session.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish();
    cookie.make_removal();
    cookie
}

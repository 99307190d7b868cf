//! Registration, email verification and password reset.

use actix_web::{HttpResponse, web};

use blog_core::services::Registration;
use blog_shared::dto::{
    ForgotPasswordRequest, MessageResponse, RegisterUserRequest, ResetPasswordRequest,
    VerifyEmailQuery,
};

use super::present;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .accounts
        .register(Registration {
            email: req.email,
            username: req.username,
            password: req.password,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(HttpResponse::Created().json(present::user(&user)))
}

/// GET /api/verify?token=
pub async fn verify_email(
    state: web::Data<AppState>,
    query: web::Query<VerifyEmailQuery>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.verify_email(&query.token).await?;

    tracing::info!(user_id = %user.id, "Email verified");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Email verified successfully")))
}

/// POST /api/forgot-password
///
/// The response is the same whether or not the email is registered.
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> AppResult<HttpResponse> {
    state.accounts.request_password_reset(&body.email).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "If an account exists for that email, a reset link has been sent",
    )))
}

/// POST /api/reset-password
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    state
        .accounts
        .reset_password(&req.token, &req.password)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password has been reset")))
}

//! Raw-body media uploads.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use futures::StreamExt;

use blog_core::domain::{MediaKind, MediaUpload};
use blog_shared::dto::UploadQuery;

use super::present;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::session::CurrentSession;
use crate::state::AppState;

/// Collect the request body, refusing to buffer more than `max_bytes`.
pub(crate) async fn read_upload(
    req: &HttpRequest,
    query: UploadQuery,
    mut payload: web::Payload,
    max_bytes: usize,
) -> AppResult<MediaUpload> {
    let mut bytes = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        if bytes.len() + chunk.len() > max_bytes {
            return Err(AppError::BadRequest(format!(
                "File exceeds the {} byte limit",
                max_bytes
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    Ok(MediaUpload {
        file_name: query.filename.unwrap_or_else(|| "upload".to_string()),
        content_type,
        bytes,
    })
}

/// POST /api/upload
pub async fn upload(
    state: web::Data<AppState>,
    current: CurrentSession,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    current.session.require()?;
    let upload = read_upload(&req, query.into_inner(), payload, state.max_upload_bytes).await?;

    let stored = state
        .media
        .upload(&current.session, upload, MediaKind::Attachment)
        .await?;

    tracing::info!(key = %stored.key, "Media uploaded");
    Ok(HttpResponse::Ok().json(present::media(stored)))
}

//! Error handling - RFC 7807 compliant responses.

use actix_web::error::{InternalError, JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use blog_core::DomainError;
use blog_core::error::RepoError;
use blog_shared::ErrorResponse;

use crate::observability::RequestId;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Too many requests, retry in {0}s")]
    TooManyRequests(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized("Please sign in to continue."),
            AppError::Forbidden => {
                ErrorResponse::forbidden("You are not allowed to modify this resource.")
            }
            AppError::TooManyRequests(secs) => ErrorResponse::too_many_requests(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                secs
            )),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        let mut response = HttpResponse::build(self.status_code());
        if let AppError::TooManyRequests(secs) = self {
            response.insert_header(("Retry-After", secs.to_string()));
        }
        response.json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            duplicate @ DomainError::Duplicate { .. } => AppError::BadRequest(duplicate.to_string()),
            DomainError::Store(e) => e.into(),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => {
                tracing::warn!("Constraint violation reached the API: {}", msg);
                AppError::BadRequest("Request conflicts with existing data".to_string())
            }
            RepoError::Connection(msg) => {
                AppError::Internal(format!("Database connection error: {}", msg))
            }
            RepoError::Query(msg) => AppError::Internal(format!("Database query error: {}", msg)),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

fn bad_request_with_id(req: &HttpRequest, detail: String) -> HttpResponse {
    let mut body = ErrorResponse::bad_request(detail);
    if let Some(id) = req.extensions().get::<RequestId>() {
        body = body.with_request_id(id.as_str());
    }
    HttpResponse::BadRequest().json(body)
}

/// Malformed JSON bodies become 400 problem details.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let response = bad_request_with_id(req, format!("Invalid JSON body: {}", err));
    InternalError::from_response(err, response).into()
}

/// Malformed path segments (e.g. a post id that is not a UUID).
pub fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    let response = bad_request_with_id(req, format!("Invalid path parameter: {}", err));
    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    let response = bad_request_with_id(req, format!("Invalid query string: {}", err));
    InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::Unauthorized, StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden, StatusCode::FORBIDDEN),
            (DomainError::post_not_found(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                DomainError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Duplicate { field: "email" },
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Store(RepoError::Query("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (domain, expected) in cases {
            assert_eq!(AppError::from(domain).status_code(), expected);
        }
    }

    #[actix_web::test]
    async fn test_internal_error_body_hides_detail() {
        let response = AppError::Internal("password column missing".to_string()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("Internal Server Error"));
        assert!(!text.contains("password column"));
    }

    #[test]
    fn test_duplicate_names_the_field() {
        let err = AppError::from(DomainError::Duplicate { field: "username" });
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("username")));
    }
}

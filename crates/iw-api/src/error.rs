//! Maps `AppError` onto HTTP responses at the handler boundary.
//!
//! Handlers intercept the errors that have page-level recovery semantics
//! (validation re-renders the form, permission and authentication failures
//! redirect); what reaches this type gets a plain status response.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use iw_core::error::AppError;

#[derive(Debug)]
pub struct WebError(pub AppError);

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for WebError {
    fn from(err: AppError) -> Self {
        WebError(err)
    }
}

impl ResponseError for WebError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AppError::InvalidPage(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(msg) = &self.0 {
            log::error!("request failed: {msg}");
        }
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}

/// Shorthand for wrapping port failures that have no page-level recovery.
pub fn internal(err: anyhow::Error) -> WebError {
    WebError(AppError::internal(err))
}

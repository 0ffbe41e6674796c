use axum::http::StatusCode;
use axum::response::Response;

use crate::api::error_response;

/// Errors a handler can return to the client.
///
/// Upstream model failures never show up here: the scan pipeline absorbs
/// them by falling back to the mock generator. Persistence failures inside
/// the pipeline are logged and swallowed as well.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Symbolic code, mapped to the numeric `err_code` by the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "bad_request",
            AppError::Unauthenticated(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn into_response(self, trace_id: &str) -> Response {
        if let AppError::Internal(msg) = &self {
            tracing::error!(trace_id = %trace_id, error = %msg, "Unhandled error");
        }
        error_response(self.status(), trace_id, self.code(), &self.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_line_up() {
        let cases = [
            (AppError::InvalidInput("x".into()), 400, "bad_request"),
            (AppError::Unauthenticated("x".into()), 401, "unauthorized"),
            (AppError::Forbidden("x".into()), 403, "forbidden"),
            (AppError::NotFound("x".into()), 404, "not_found"),
            (AppError::Internal("x".into()), 500, "internal_error"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn anyhow_becomes_internal_with_message() {
        let err: AppError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, AppError::Internal(ref m) if m == "disk full"));
    }
}

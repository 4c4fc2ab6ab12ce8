//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{ "error": { "status", "name", "message" } }`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use promtech_core::stores::TotalOverflow;
use serde::Serialize;
use thiserror::Error;

use crate::cms::CmsError;
use crate::services::{NotifyError, UpstreamError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// CMS request failed.
    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),

    /// Notification bot request failed.
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Third-party lookup (exchange rates, geocoder) failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    status: u16,
    name: &'static str,
    message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Cms(CmsError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Cms(_)
            | Self::Notify(_)
            | Self::Upstream(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn name(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => "NotFoundError",
            StatusCode::BAD_REQUEST => "ValidationError",
            _ => "InternalServerError",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose upstream error details to clients
        let message = match &self {
            Self::Cms(CmsError::NotFound(what)) => format!("{what} not found"),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Cms(_) | Self::Upstream(_) => "External service error".to_string(),
            Self::Notify(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                status: status.as_u16(),
                name: self.name(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => Self::BadRequest(e.body_text()),
            other => Self::Internal(other.body_text()),
        }
    }
}

impl From<TotalOverflow> for AppError {
    fn from(e: TotalOverflow) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product".to_string());
        assert_eq!(err.to_string(), "Not found: Product");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Cms(CmsError::NotFound("Category".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cms(CmsError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::Request;

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\":"))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();

        assert_eq!(AppError::from(rejection).status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_path_rejections() {
        use axum::extract::{FromRequestParts, Path};
        use axum::http::Request;

        // Outside a router there are no captured params at all.
        let (mut parts, ()) = Request::builder()
            .uri("/api/cart/items/abc")
            .body(())
            .unwrap()
            .into_parts();
        let rejection = Path::<i64>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        assert_eq!(
            AppError::from(rejection).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_total_overflow_is_a_validation_error() {
        let err = AppError::from(TotalOverflow);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Bad request: total price is out of range");
    }

    #[tokio::test]
    async fn test_error_body_hides_upstream_details() {
        let response = AppError::Cms(CmsError::Api {
            status: 401,
            message: "token abc expired".to_string(),
        })
        .into_response();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["status"], 500);
        assert_eq!(body["error"]["name"], "InternalServerError");
        assert_eq!(body["error"]["message"], "External service error");
    }

    #[tokio::test]
    async fn test_validation_message_is_passed_through() {
        let response = AppError::BadRequest("Укажите телефон".to_string()).into_response();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["status"], 400);
        assert_eq!(body["error"]["name"], "ValidationError");
        assert_eq!(body["error"]["message"], "Укажите телефон");
    }
}

use crate::core::bbox::BboxError;
use crate::models::ErrorResponse;
use crate::services::postgres::PostgresError;
use crate::services::upstream::Upstream;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use validator::ValidationErrors;

/// Route-level failures, rendered as `{"error": {"code": ..}}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("unsupported geography: {0}")]
    UnsupportedGeo(String),

    #[error("not found")]
    NotFound,

    #[error("{upstream} unavailable")]
    UpstreamUnavailable {
        upstream: Upstream,
        /// Only rendered when the caller asked for debug output
        detail: Option<String>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "BAD_REQUEST",
            ApiError::UnsupportedGeo(_) => "UNSUPPORTED_GEO",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            ApiError::Internal(_) => "SERVER_ERROR",
        }
    }

    /// Upstream failure, keeping `detail` only in debug mode
    pub fn upstream(upstream: Upstream, detail: impl ToString, debug: bool) -> Self {
        ApiError::UpstreamUnavailable {
            upstream,
            detail: debug.then(|| detail.to_string()),
        }
    }

    fn body(&self) -> ErrorResponse {
        let body = ErrorResponse::new(self.code());
        match self {
            ApiError::Validation(message) => body.with_message(message.clone()),
            ApiError::UpstreamUnavailable { upstream, detail } => {
                body.with_upstream(upstream.label()).with_detail(detail.clone())
            }
            _ => body,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::UnsupportedGeo(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl From<BboxError> for ApiError {
    fn from(err: BboxError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<PostgresError> for ApiError {
    fn from(err: PostgresError) -> Self {
        tracing::error!("Database error: {}", err);
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_upstream_error_envelope() {
        let err = ApiError::upstream(Upstream::Hud, "HTTP 502", false);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": { "code": "UPSTREAM_UNAVAILABLE", "upstream": "HUD" } }));
    }

    #[actix_web::test]
    async fn test_debug_detail_is_rendered() {
        let err = ApiError::upstream(Upstream::Bls, "HTTP 500", true);
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["detail"], "HTTP 500");
    }

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::Validation("x".into()).code(), "BAD_REQUEST");
        assert_eq!(ApiError::UnsupportedGeo("tract".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Internal("boom".into()).code(), "SERVER_ERROR");
    }
}

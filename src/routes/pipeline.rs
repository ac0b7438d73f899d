//! Shared cache-lookup / fetch / cache-store flow for the upstream-backed routes.

use crate::core::fields::is_truthy;
use crate::core::retry::RetryPolicy;
use crate::error::ApiError;
use crate::services::cache::{ResponseCache, TtlPolicy};
use crate::services::upstream::Upstream;
use crate::sources::NormalizeError;
use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

pub const CACHE_HEADER: &str = "x-cache";

/// Serve `key` from cache, or run `produce` and cache its payload
///
/// Cache read and write failures are logged and otherwise ignored; the
/// request then behaves as a miss.
pub async fn serve_cached<T, F, Fut>(
    cache: &dyn ResponseCache,
    key: &str,
    ttl: TtlPolicy,
    produce: F,
) -> Result<HttpResponse, ApiError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match cache.get(key).await {
        Ok(Some(json)) => {
            tracing::debug!("Cache hit: {}", key);
            return Ok(json_response(json, "hit"));
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache get error for {}: {}", key, e),
    }

    let payload = produce().await?;
    let json = serde_json::to_string(&payload).map_err(|e| ApiError::Internal(e.to_string()))?;

    match cache.set(key, &json, ttl.resolve()).await {
        Ok(()) => tracing::debug!("Cache set: {}", key),
        Err(e) => tracing::warn!("Cache set error for {}: {}", key, e),
    }

    Ok(json_response(json, "miss"))
}

fn json_response(json: String, cache_status: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header((CACHE_HEADER, cache_status))
        .body(json)
}

/// Route-specific retry budget on top of the configured backoff shape
pub fn retry_budget(base: &RetryPolicy, upstream: Upstream) -> RetryPolicy {
    match upstream {
        Upstream::Usda => base.with_budget(4, Duration::from_secs(8)),
        Upstream::Hud | Upstream::Bls => base.with_budget(3, Duration::from_secs(10)),
        // Nominatim's usage policy asks clients not to hammer it
        Upstream::Nominatim => base.with_budget(0, Duration::from_secs(10)),
    }
}

/// `debug` query flag: `1`/`true`/any word turns it on, empty, `0` and `false` do not
pub fn debug_enabled(debug: Option<&str>) -> bool {
    let Some(raw) = debug.map(str::trim) else {
        return false;
    };
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    is_truthy(&value)
}

pub fn upstream_failure(upstream: Upstream, err: impl Display, debug: bool) -> ApiError {
    tracing::error!("{} upstream error: {}", upstream, err);
    ApiError::upstream(upstream, err, debug)
}

pub fn normalize_failure(upstream: Upstream, err: NormalizeError, debug: bool) -> ApiError {
    match err {
        NormalizeError::NotFound(what) => {
            tracing::info!("{} returned no record: {}", upstream, what);
            ApiError::NotFound
        }
        err @ NormalizeError::UpstreamErrorBody(_) => upstream_failure(upstream, err, debug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag() {
        assert!(!debug_enabled(None));
        assert!(!debug_enabled(Some("")));
        assert!(!debug_enabled(Some("0")));
        assert!(!debug_enabled(Some("false")));
        assert!(debug_enabled(Some("1")));
        assert!(debug_enabled(Some("true")));
        assert!(debug_enabled(Some("yes")));
    }

    #[test]
    fn test_retry_budgets() {
        let base = RetryPolicy::default();
        assert_eq!(retry_budget(&base, Upstream::Usda).max_retries, 4);
        assert_eq!(retry_budget(&base, Upstream::Usda).timeout, Duration::from_secs(8));
        assert_eq!(retry_budget(&base, Upstream::Hud).max_retries, 3);
        assert_eq!(retry_budget(&base, Upstream::Bls).max_retries, 3);
        assert_eq!(retry_budget(&base, Upstream::Nominatim).max_retries, 0);
    }

    #[test]
    fn test_normalize_failure_mapping() {
        assert!(matches!(
            normalize_failure(Upstream::Hud, NormalizeError::NotFound("x".into()), false),
            ApiError::NotFound
        ));
        assert!(matches!(
            normalize_failure(Upstream::Hud, NormalizeError::UpstreamErrorBody("x".into()), true),
            ApiError::UpstreamUnavailable { detail: Some(_), .. }
        ));
    }
}

use super::pipeline::{debug_enabled, normalize_failure, retry_budget, serve_cached, upstream_failure};
use super::AppState;
use crate::core::hashing::CacheKey;
use crate::error::ApiError;
use crate::models::GeocodeQuery;
use crate::services::upstream::{no_body_check, Upstream};
use crate::sources::{build_nominatim_url, transform_nominatim};
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/geocode", web::get().to(geocode));
}

/// Free-text place lookup, US only
///
/// GET /api/geocode?q=
async fn geocode(state: web::Data<AppState>, query: web::Query<GeocodeQuery>) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing location query.".to_string()))?;

    let state = state.get_ref();
    let debug = debug_enabled(query.debug.as_deref());

    let key = CacheKey::geocode(q);
    tracing::info!("Geocode request: q={:?}", q);

    serve_cached(state.cache.as_ref(), &key, state.ttls.geocode, move || async move {
        let url = build_nominatim_url(q, &state.endpoints.nominatim);
        let policy = retry_budget(&state.retry, Upstream::Nominatim);

        let json = state
            .upstream
            .get_json(Upstream::Nominatim, &url, &policy, no_body_check)
            .await
            .map_err(|e| upstream_failure(Upstream::Nominatim, e, debug))?;

        transform_nominatim(&json, q).map_err(|e| normalize_failure(Upstream::Nominatim, e, debug))
    })
    .await
}

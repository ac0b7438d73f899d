use super::pipeline::{debug_enabled, normalize_failure, retry_budget, serve_cached, upstream_failure};
use super::AppState;
use crate::core::hashing::CacheKey;
use crate::error::ApiError;
use crate::models::{UnemploymentQuery, UnemploymentResponse};
use crate::services::upstream::Upstream;
use crate::sources::{bls_status_error, build_bls_request_body, normalize_bls_timeseries, to_series_id};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

pub const LAUS_SOURCE: &str = "BLS LAUS";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/jobs/unemployment", web::get().to(county_unemployment));
}

/// Monthly county unemployment rate (LAUS, not seasonally adjusted)
///
/// GET /api/jobs/unemployment?countyFips=&start=&end=
async fn county_unemployment(
    state: web::Data<AppState>,
    query: web::Query<UnemploymentQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate()?;

    let state = state.get_ref();
    let county_fips = query.county_fips.as_str();
    let (start, end) = (query.start, query.end);
    let debug = debug_enabled(query.debug.as_deref());

    let key = CacheKey::laus(county_fips, start, end);
    tracing::info!("Unemployment request: countyFips={} start={} end={}", county_fips, start, end);

    serve_cached(state.cache.as_ref(), &key, state.ttls.laus, move || async move {
        let series_id = to_series_id(county_fips);
        let body = build_bls_request_body(&series_id, start, end, state.endpoints.bls_api_key.as_deref());
        let policy = retry_budget(&state.retry, Upstream::Bls);

        let json = state
            .upstream
            .post_json(Upstream::Bls, &state.endpoints.bls, &body, &policy, bls_status_error)
            .await
            .map_err(|e| upstream_failure(Upstream::Bls, e, debug))?;

        let series = normalize_bls_timeseries(&json, &series_id)
            .map_err(|e| normalize_failure(Upstream::Bls, e, debug))?;

        Ok::<_, ApiError>(UnemploymentResponse {
            series,
            source: LAUS_SOURCE.to_string(),
            last_updated: Utc::now(),
        })
    })
    .await
}

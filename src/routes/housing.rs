use super::pipeline::{debug_enabled, normalize_failure, retry_budget, serve_cached, upstream_failure};
use super::AppState;
use crate::core::hashing::CacheKey;
use crate::error::ApiError;
use crate::models::{CounselorsQuery, FmrQuery, FmrResponse, ItemsResponse};
use crate::services::upstream::Upstream;
use crate::sources::counselors::clamp_radius;
use crate::sources::{build_hud_counselors_url, build_hud_fmr_url, error_envelope, transform_hud_fmr, transform_hud_to_counselors};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

pub const COUNSELORS_SOURCE: &str = "HUD Housing Counselor API";
pub const FMR_SOURCE: &str = "HUD FMR API";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/housing/counselors", web::get().to(housing_counselors))
        .route("/housing/fmr", web::get().to(fair_market_rents));
}

/// HUD-approved housing counselors near a point
///
/// GET /api/housing/counselors?lat=&lon=&radius=
async fn housing_counselors(
    state: web::Data<AppState>,
    query: web::Query<CounselorsQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate()?;

    let state = state.get_ref();
    let (lat, lon) = (query.lat, query.lon);
    let radius = clamp_radius(query.radius);
    let debug = debug_enabled(query.debug.as_deref());

    let key = CacheKey::counselors(lat, lon, radius);
    tracing::info!("Counselors request: lat={} lon={} radius={}", lat, lon, radius);

    serve_cached(state.cache.as_ref(), &key, state.ttls.counselors, move || async move {
        let url = build_hud_counselors_url(lat, lon, radius, &state.endpoints.hud_counselors);
        let policy = retry_budget(&state.retry, Upstream::Hud);

        let json = state
            .upstream
            .get_json(Upstream::Hud, &url, &policy, error_envelope)
            .await
            .map_err(|e| upstream_failure(Upstream::Hud, e, debug))?;

        let items = transform_hud_to_counselors(&json).map_err(|e| normalize_failure(Upstream::Hud, e, debug))?;

        Ok::<_, ApiError>(ItemsResponse::new(items, COUNSELORS_SOURCE))
    })
    .await
}

/// Fair Market Rents for a county and fiscal year
///
/// GET /api/housing/fmr?fips=&year=
async fn fair_market_rents(
    state: web::Data<AppState>,
    query: web::Query<FmrQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate()?;

    let state = state.get_ref();
    let fips = query.fips.as_str();
    let year = query.year;
    let debug = debug_enabled(query.debug.as_deref());

    let key = CacheKey::fmr(fips, year);
    tracing::info!("FMR request: fips={} year={}", fips, year);

    serve_cached(state.cache.as_ref(), &key, state.ttls.fmr, move || async move {
        let url = build_hud_fmr_url(fips, year, &state.endpoints.hud_fmr);
        let policy = retry_budget(&state.retry, Upstream::Hud);

        let json = state
            .upstream
            .get_json(Upstream::Hud, &url, &policy, error_envelope)
            .await
            .map_err(|e| upstream_failure(Upstream::Hud, e, debug))?;

        let fmr = transform_hud_fmr(&json).map_err(|e| normalize_failure(Upstream::Hud, e, debug))?;

        Ok::<_, ApiError>(FmrResponse {
            year,
            fmr,
            source: FMR_SOURCE.to_string(),
            last_updated: Utc::now(),
            data_vintage: year.to_string(),
        })
    })
    .await
}

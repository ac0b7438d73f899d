use super::pipeline::{debug_enabled, normalize_failure, retry_budget, serve_cached, upstream_failure};
use super::AppState;
use crate::core::bbox::Bbox;
use crate::core::hashing::CacheKey;
use crate::error::ApiError;
use crate::models::{ItemsResponse, SnapQuery};
use crate::services::upstream::Upstream;
use crate::sources::snap::clamp_limit;
use crate::sources::{build_arcgis_url, error_envelope, filter_by_store_types, transform_arcgis_to_snap_items};
use actix_web::{web, HttpResponse};
use validator::Validate;

pub const SNAP_SOURCE: &str = "USDA ArcGIS";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/food/snap", web::get().to(snap_retailers));
}

/// SNAP-authorized retailers inside a bounding box
///
/// GET /api/food/snap?bbox=minLon,minLat,maxLon,maxLat&types=&limit=
async fn snap_retailers(
    state: web::Data<AppState>,
    query: web::Query<SnapQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate()?;

    let state = state.get_ref();
    let bbox = Bbox::parse(&query.bbox)?.clamp_to_world();
    let limit = clamp_limit(query.limit);
    let types = query.types.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let debug = debug_enabled(query.debug.as_deref());

    let key = CacheKey::snap(&bbox.to_query_param(), types, limit);
    tracing::info!("SNAP request: bbox={} types={:?} limit={}", bbox, types, limit);

    serve_cached(state.cache.as_ref(), &key, state.ttls.snap, move || async move {
        let url = build_arcgis_url(bbox, limit, &state.endpoints.snap, state.snap_spatial_ref);
        let policy = retry_budget(&state.retry, Upstream::Usda);

        let json = state
            .upstream
            .get_json(Upstream::Usda, &url, &policy, error_envelope)
            .await
            .map_err(|e| upstream_failure(Upstream::Usda, e, debug))?;

        let items = transform_arcgis_to_snap_items(&json)
            .map_err(|e| normalize_failure(Upstream::Usda, e, debug))?;
        let mut items = filter_by_store_types(items, types);
        items.truncate(limit as usize);

        Ok::<_, ApiError>(ItemsResponse::new(items, SNAP_SOURCE))
    })
    .await
}

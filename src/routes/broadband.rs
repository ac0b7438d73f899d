use super::AppState;
use crate::error::ApiError;
use crate::models::{BroadbandQuery, BroadbandResponse, GeoLevel};
use actix_web::{web, HttpResponse};
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/broadband/summary", web::get().to(broadband_summary));
}

fn parse_geo(geo: Option<&str>) -> Result<GeoLevel, ApiError> {
    match geo {
        None | Some("county") => Ok(GeoLevel::County),
        Some("tract") => Ok(GeoLevel::Tract),
        Some(other) => Err(ApiError::Validation(format!("geo must be county or tract, got {:?}", other))),
    }
}

/// Latest pre-ingested broadband availability for an area
///
/// GET /api/broadband/summary?geo=county&fips=
async fn broadband_summary(
    state: web::Data<AppState>,
    query: web::Query<BroadbandQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate()?;
    let geo = parse_geo(query.geo.as_deref())?;

    // Only county summaries are ingested so far
    if geo != GeoLevel::County {
        return Err(ApiError::UnsupportedGeo(geo.as_str().to_string()));
    }

    tracing::info!("Broadband request: geo={} fips={}", geo.as_str(), query.fips);

    let summary = state
        .broadband
        .latest_summary(geo, &query.fips)
        .await?
        .ok_or(ApiError::NotFound)?;

    let data_vintage = summary.data_vintage();
    Ok(HttpResponse::Ok().json(BroadbandResponse {
        provider_count: summary.provider_count,
        speed: summary.speed,
        tech: summary.tech,
        data_vintage,
        as_of: summary.as_of,
        source: summary.source,
        last_updated: summary.fetched_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geo() {
        assert_eq!(parse_geo(None).unwrap(), GeoLevel::County);
        assert_eq!(parse_geo(Some("tract")).unwrap(), GeoLevel::Tract);
        assert!(matches!(parse_geo(Some("state")), Err(ApiError::Validation(_))));
    }
}

use super::NormalizeError;
use crate::core::fields::{coerce_number, scalar_to_string};
use crate::models::GeocodeResult;
use reqwest::Url;
use serde_json::Value;

pub const USER_AGENT: &str = "CivicLifeline/1.0 (contact@civiclifeline.org)";

/// Single best US match for a free-text place query
pub fn build_nominatim_url(query: &str, endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("format", "jsonv2")
        .append_pair("addressdetails", "1")
        .append_pair("limit", "1")
        .append_pair("countrycodes", "us");
    url
}

pub fn transform_nominatim(json: &Value, query: &str) -> Result<GeocodeResult, NormalizeError> {
    let first = json
        .as_array()
        .and_then(|results| results.first())
        .ok_or_else(|| NormalizeError::NotFound(format!("no matching locations for {:?}", query)))?;

    let lat = first.get("lat").and_then(coerce_number);
    let lon = first.get("lon").and_then(coerce_number);
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(NormalizeError::UpstreamErrorBody(
                "geocoder returned invalid coordinates".to_string(),
            ))
        }
    };

    Ok(GeocodeResult {
        lat,
        lon,
        name: first
            .get("display_name")
            .and_then(scalar_to_string)
            .unwrap_or_else(|| query.to_string()),
    })
}

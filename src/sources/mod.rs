//! Upstream dataset adapters: URL builders and pure JSON normalizers.
//!
//! Normalizers never fail on odd shapes; anything unrecognised normalizes to
//! an empty result. The exception is an explicit error envelope from the
//! upstream, which is surfaced as [`NormalizeError::UpstreamErrorBody`].

pub mod counselors;
pub mod fmr;
pub mod geocode;
pub mod laus;
pub mod snap;

use crate::core::fields::{is_truthy, scalar_to_string};
use serde_json::Value;
use thiserror::Error;

pub use counselors::{build_hud_counselors_url, transform_hud_to_counselors};
pub use fmr::{build_hud_fmr_url, transform_hud_fmr};
pub use geocode::{build_nominatim_url, transform_nominatim};
pub use laus::{bls_status_error, build_bls_request_body, normalize_bls_timeseries, to_series_id};
pub use snap::{build_arcgis_url, filter_by_store_types, transform_arcgis_to_snap_items, EnvelopeSpatialRef};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("upstream returned an error body: {0}")]
    UpstreamErrorBody(String),

    #[error("no matching record: {0}")]
    NotFound(String),
}

/// Detect an `{ "error": ... }` envelope (ArcGIS and HUD style)
///
/// Returns the most descriptive message available.
pub fn error_envelope(value: &Value) -> Option<String> {
    let error = value.as_object()?.get("error")?;
    if !is_truthy(error) {
        return None;
    }
    let message = error
        .get("message")
        .and_then(scalar_to_string)
        .or_else(|| scalar_to_string(error))
        .unwrap_or_else(|| "error body".to_string());
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_detection() {
        assert_eq!(
            error_envelope(&json!({ "error": { "code": 400, "message": "Invalid query" } })),
            Some("Invalid query".to_string())
        );
        assert_eq!(error_envelope(&json!({ "error": "denied" })), Some("denied".to_string()));
        assert_eq!(error_envelope(&json!({ "error": null, "features": [] })), None);
        assert_eq!(error_envelope(&json!([1, 2])), None);
    }
}

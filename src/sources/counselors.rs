use super::{error_envelope, NormalizeError};
use crate::core::fields::FieldTable;
use crate::core::hashing::record_id;
use crate::models::CounselorItem;
use reqwest::Url;
use serde_json::Value;

pub const DEFAULT_RADIUS_MILES: u32 = 30;
pub const MIN_RADIUS_MILES: u32 = 5;
pub const MAX_RADIUS_MILES: u32 = 100;

const LIST: &[&str] = &["results", "agencies", "items"];
const ID: &[&str] = &["id", "agc_code", "agency_id", "org_id"];
const NAME: &[&str] = &["name", "agency_name", "org_name", "nme"];
const PHONE: &[&str] = &["phone", "agency_phone", "phone1"];
const WEBSITE: &[&str] = &["website", "agency_website", "weburl"];
const SERVICES_ARRAY: &[&str] = &["services"];
const SERVICES_CSV: &[&str] = &["services_offered", "services"];
const LANGUAGES_ARRAY: &[&str] = &["languages"];
const LANGUAGES_CSV: &[&str] = &["languages_spoken", "languages"];
const LAT: &[&str] = &["latitude", "lat"];
const LON: &[&str] = &["longitude", "lng", "lon"];

/// Clamp a requested search radius into `5..=100` miles, defaulting to 30
pub fn clamp_radius(radius: Option<i64>) -> u32 {
    match radius {
        Some(r) => r.clamp(MIN_RADIUS_MILES as i64, MAX_RADIUS_MILES as i64) as u32,
        None => DEFAULT_RADIUS_MILES,
    }
}

/// Proximity search URL for the HUD housing counselor API
pub fn build_hud_counselors_url(lat: f64, lon: f64, radius: u32, endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("lat", &lat.to_string())
        .append_pair("lng", &lon.to_string())
        .append_pair("distance", &radius.to_string());
    url
}

/// Map a HUD agency listing to counselor items, dropping nameless agencies
pub fn transform_hud_to_counselors(json: &Value) -> Result<Vec<CounselorItem>, NormalizeError> {
    if let Some(message) = error_envelope(json) {
        return Err(NormalizeError::UpstreamErrorBody(message));
    }

    // Some deployments return the bare array
    let list = match json {
        Value::Array(items) => Some(items),
        _ => FieldTable::from_value(json).raw(LIST).and_then(Value::as_array),
    };

    Ok(list
        .map(|agencies| agencies.iter().filter_map(agency_to_item).collect())
        .unwrap_or_default())
}

fn agency_to_item(agency: &Value) -> Option<CounselorItem> {
    let fields = FieldTable::from_value(agency);
    let name = fields.string(NAME)?;

    let id = fields
        .string(ID)
        .unwrap_or_else(|| record_id(&agency.to_string()));

    let coords = match (fields.coerced_number(LON), fields.coerced_number(LAT)) {
        (Some(lon), Some(lat)) => Some([lon, lat]),
        _ => None,
    };

    Some(CounselorItem {
        id,
        name,
        phone: fields.string(PHONE),
        website: fields.string(WEBSITE),
        services: fields.string_list(SERVICES_ARRAY, SERVICES_CSV),
        languages: fields.string_list(LANGUAGES_ARRAY, LANGUAGES_CSV),
        coords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transform_agencies() {
        let json = json!({
            "agencies": [
                {
                    "agc_CODE": "80123",
                    "ORG_NAME": "Delta Housing Counseling",
                    "PHONE": "601-555-0100",
                    "services_offered": "Rental, Foreclosure",
                    "languages": ["English", "Spanish"],
                    "LATITUDE": "32.85",
                    "LONGITUDE": "-90.41"
                },
                { "agency_name": "" },
                { "name": "No Id Agency" }
            ]
        });

        let items = transform_hud_to_counselors(&json).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.id, "80123");
        assert_eq!(first.name, "Delta Housing Counseling");
        assert_eq!(first.phone.as_deref(), Some("601-555-0100"));
        assert_eq!(first.services, Some(vec!["Rental".to_string(), "Foreclosure".to_string()]));
        assert_eq!(first.languages, Some(vec!["English".to_string(), "Spanish".to_string()]));
        assert_eq!(first.coords, Some([-90.41, 32.85]));

        let second = &items[1];
        assert_eq!(second.id.len(), 40);
        assert_eq!(second.coords, None);
        assert_eq!(second.services, None);
    }

    #[test]
    fn test_fallback_id_is_stable() {
        let json = json!([{ "name": "Same Agency", "city": "Jackson" }]);
        let a = transform_hud_to_counselors(&json).unwrap();
        let b = transform_hud_to_counselors(&json).unwrap();
        assert_eq!(a[0].id, b[0].id);
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(transform_hud_to_counselors(&json!("text")).unwrap().is_empty());
        assert!(transform_hud_to_counselors(&json!({ "results": {} })).unwrap().is_empty());
        assert!(matches!(
            transform_hud_to_counselors(&json!({ "error": "token expired" })),
            Err(NormalizeError::UpstreamErrorBody(_))
        ));
    }

    #[test]
    fn test_build_url_and_radius() {
        let endpoint = Url::parse("https://data.hud.gov/housing_counseling/search").unwrap();
        let url = build_hud_counselors_url(32.5, -90.25, 30, &endpoint);
        assert_eq!(url.query(), Some("lat=32.5&lng=-90.25&distance=30"));

        assert_eq!(clamp_radius(None), 30);
        assert_eq!(clamp_radius(Some(1)), 5);
        assert_eq!(clamp_radius(Some(500)), 100);
    }
}

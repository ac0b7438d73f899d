use super::{error_envelope, NormalizeError};
use crate::core::bbox::{to_web_mercator, Bbox};
use crate::core::fields::FieldTable;
use crate::core::hashing::record_id;
use crate::models::SnapItem;
use reqwest::Url;
use serde_json::Value;
use std::collections::HashSet;

pub const DEFAULT_LIMIT: u32 = 300;
pub const MAX_LIMIT: u32 = 500;

const OUT_FIELDS: &[&str] = &[
    "Store_Name",
    "Store_Street_Address",
    "Additonal_Address",
    "City",
    "State",
    "Zip_Code",
    "Zip4",
    "County",
    "Store_Type",
    "Latitude",
    "Longitude",
    "Incentive_Program",
    "Grantee_Name",
];

// Candidate attribute names per logical field, in priority order
const NAME: &[&str] = &["store_name", "storename", "name"];
const STREET: &[&str] = &["store_street_address", "street_address", "address", "addr", "site_address"];
// "Additonal" is the layer's own spelling
const STREET_2: &[&str] = &["additonal_address", "additional_address"];
const CITY: &[&str] = &["city", "municipality"];
const STATE: &[&str] = &["state", "st"];
const ZIP: &[&str] = &["zip", "zip_code", "zipcode", "postalcode"];
const ZIP4: &[&str] = &["zip4", "zip_4", "zipcode_4"];
const STORE_TYPE: &[&str] = &["store_type", "type", "category"];
const PHONE: &[&str] = &["phone", "phone_number", "phonenumber", "phone number"];
const HOURS: &[&str] = &["hours", "store_hours", "opening_hours", "open_hours", "operation_hours"];
const LON: &[&str] = &["longitude", "lon", "x"];
const LAT: &[&str] = &["latitude", "lat", "y"];

/// Spatial reference the query envelope is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeSpatialRef {
    /// Plain lon/lat (EPSG:4326); the envelope equals the request bbox
    #[default]
    Wgs84,
    /// Projected meters (EPSG:3857 / ESRI 102100)
    WebMercator,
}

impl EnvelopeSpatialRef {
    pub fn wkid(&self) -> &'static str {
        match self {
            EnvelopeSpatialRef::Wgs84 => "4326",
            EnvelopeSpatialRef::WebMercator => "102100",
        }
    }
}

/// Clamp a requested result count into `1..=500`, defaulting to 300
pub fn clamp_limit(limit: Option<i64>) -> u32 {
    match limit {
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as u32,
        None => DEFAULT_LIMIT,
    }
}

/// Build the FeatureServer query URL for retailers intersecting `bbox`
pub fn build_arcgis_url(bbox: Bbox, limit: u32, endpoint: &Url, spatial_ref: EnvelopeSpatialRef) -> Url {
    let geometry = match spatial_ref {
        EnvelopeSpatialRef::Wgs84 => bbox.to_query_param(),
        EnvelopeSpatialRef::WebMercator => {
            let (min_x, min_y) = to_web_mercator(bbox.min_lon, bbox.min_lat);
            let (max_x, max_y) = to_web_mercator(bbox.max_lon, bbox.max_lat);
            format!("{},{},{},{}", min_x, min_y, max_x, max_y)
        }
    };

    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("f", "json")
        .append_pair("where", "1=1")
        .append_pair("inSR", spatial_ref.wkid())
        .append_pair("outSR", "4326")
        .append_pair("spatialRel", "esriSpatialRelIntersects")
        .append_pair("returnGeometry", "true")
        .append_pair("geometryType", "esriGeometryEnvelope")
        .append_pair("geometry", &geometry)
        .append_pair("outFields", &OUT_FIELDS.join(","))
        .append_pair("resultOffset", "0")
        .append_pair("resultRecordCount", &limit.to_string())
        .append_pair("geometryPrecision", "5");
    url
}

/// Map an ArcGIS feature collection to SNAP items
///
/// Features missing a name, street address, or numeric coordinates are skipped.
pub fn transform_arcgis_to_snap_items(json: &Value) -> Result<Vec<SnapItem>, NormalizeError> {
    if let Some(message) = error_envelope(json) {
        return Err(NormalizeError::UpstreamErrorBody(message));
    }

    let features = match json.get("features").and_then(Value::as_array) {
        Some(features) => features,
        None => return Ok(Vec::new()),
    };

    Ok(features.iter().filter_map(feature_to_item).collect())
}

fn feature_to_item(feature: &Value) -> Option<SnapItem> {
    let attrs = FieldTable::from_option(feature.get("attributes"));
    let geometry = feature.get("geometry");

    let name = attrs.string(NAME)?;
    let street = attrs.string(STREET)?;

    let x = geometry
        .and_then(|g| g.get("x"))
        .and_then(Value::as_f64)
        .or_else(|| attrs.number(LON))?;
    let y = geometry
        .and_then(|g| g.get("y"))
        .and_then(Value::as_f64)
        .or_else(|| attrs.number(LAT))?;

    let zip = attrs.string(ZIP);
    let postal = match (zip, attrs.string(ZIP4)) {
        (Some(zip), Some(zip4)) => Some(format!("{}-{}", zip, zip4)),
        (zip, _) => zip,
    };

    let address = [
        Some(street),
        attrs.string(STREET_2),
        attrs.string(CITY),
        attrs.string(STATE),
        postal,
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");

    Some(SnapItem {
        id: record_id(&format!("{}|{}|{},{}", name, address, x, y)),
        name,
        address,
        coords: [x, y],
        store_type: attrs.string(STORE_TYPE),
        phone: attrs.string(PHONE),
        hours: attrs.string(HOURS),
    })
}

/// Keep items whose store type is in the comma-separated `types` list
///
/// Matching is case-insensitive; a blank list keeps everything.
pub fn filter_by_store_types(items: Vec<SnapItem>, types: Option<&str>) -> Vec<SnapItem> {
    let wanted: HashSet<String> = types
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if wanted.is_empty() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            item.store_type
                .as_ref()
                .map(|t| wanted.contains(&t.to_lowercase()))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "features": [
                {
                    "attributes": {
                        "Store_Name": "ACME MARKET",
                        "Street_Address": "123 Main St",
                        "City": "Yazoo City",
                        "State": "MS",
                        "ZIP_Code": "39194",
                        "Store_Type": "Supermarket",
                        "Phone_Number": null,
                        "HOURS": null
                    },
                    "geometry": { "x": -90.405, "y": 32.889 }
                }
            ]
        })
    }

    #[test]
    fn test_transform_complete_feature() {
        let items = transform_arcgis_to_snap_items(&sample()).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.name, "ACME MARKET");
        assert_eq!(item.address, "123 Main St, Yazoo City, MS, 39194");
        assert_eq!(item.coords, [-90.405, 32.889]);
        assert_eq!(item.store_type.as_deref(), Some("Supermarket"));
        assert_eq!(item.phone, None);
        assert_eq!(
            item.id,
            record_id("ACME MARKET|123 Main St, Yazoo City, MS, 39194|-90.405,32.889")
        );
    }

    #[test]
    fn test_id_is_stable_across_fetches() {
        let first = transform_arcgis_to_snap_items(&sample()).unwrap();
        let second = transform_arcgis_to_snap_items(&sample()).unwrap();
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn test_incomplete_features_are_dropped() {
        let json = json!({
            "features": [
                { "attributes": { "Street_Address": "1 A St" }, "geometry": { "x": 1.0, "y": 2.0 } },
                { "attributes": { "Store_Name": "No Coords", "Street_Address": "2 B St" } },
                { "attributes": { "Store_Name": "String Coords", "Street_Address": "3 C St", "Longitude": "1.5", "Latitude": "2.5" } },
                { "attributes": { "Store_Name": "Attr Coords", "Street_Address": "4 D St", "Longitude": 1.5, "Latitude": 2.5, "Zip_Code": 39194, "Zip4": "1234" } },
                "not a feature"
            ]
        });
        let items = transform_arcgis_to_snap_items(&json).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Attr Coords");
        assert_eq!(items[0].coords, [1.5, 2.5]);
        assert_eq!(items[0].address, "4 D St, 39194-1234");
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(transform_arcgis_to_snap_items(&json!(null)).unwrap().is_empty());
        assert!(transform_arcgis_to_snap_items(&json!({ "features": "nope" })).unwrap().is_empty());
        assert!(matches!(
            transform_arcgis_to_snap_items(&json!({ "error": { "code": 400, "message": "Invalid" } })),
            Err(NormalizeError::UpstreamErrorBody(_))
        ));
    }

    #[test]
    fn test_build_url_wgs84_envelope() {
        let bbox = Bbox::parse("-90.7,32.6,-90.1,33.1").unwrap().clamp_to_world();
        let endpoint = Url::parse("https://services2.arcgis.com/xyz/ArcGIS/rest/services/Test/FeatureServer/0/query").unwrap();
        let url = build_arcgis_url(bbox, 123, &endpoint, EnvelopeSpatialRef::Wgs84);

        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        assert_eq!(param("geometry").as_deref(), Some("-90.7,32.6,-90.1,33.1"));
        assert_eq!(param("resultRecordCount").as_deref(), Some("123"));
        assert_eq!(param("f").as_deref(), Some("json"));
        assert_eq!(param("inSR").as_deref(), Some("4326"));
        assert_eq!(url.path(), "/xyz/ArcGIS/rest/services/Test/FeatureServer/0/query");
    }

    #[test]
    fn test_build_url_web_mercator_envelope() {
        let bbox = Bbox::new(0.0, 0.0, 180.0, 0.0);
        let endpoint = Url::parse("https://example.test/query").unwrap();
        let url = build_arcgis_url(bbox, 10, &endpoint, EnvelopeSpatialRef::WebMercator);
        let geometry = url
            .query_pairs()
            .find(|(k, _)| k == "geometry")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let values: Vec<f64> = geometry.split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values[0], 0.0);
        assert!((values[2] - 20037508.342789244).abs() < 1e-6);
        assert!(url.query_pairs().any(|(k, v)| k == "inSR" && v == "102100"));
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 300);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(9999)), 500);
        assert_eq!(clamp_limit(Some(42)), 42);
    }

    #[test]
    fn test_filter_by_store_types() {
        let items = transform_arcgis_to_snap_items(&sample()).unwrap();
        assert_eq!(filter_by_store_types(items.clone(), Some("supermarket, convenience")).len(), 1);
        assert_eq!(filter_by_store_types(items.clone(), Some("convenience")).len(), 0);
        assert_eq!(filter_by_store_types(items, Some(" , ")).len(), 1);
    }
}

use super::{error_envelope, NormalizeError};
use crate::core::fields::FieldTable;
use crate::models::FmrRecord;
use reqwest::Url;
use serde_json::Value;

const RECORD: &[&str] = &["fmr", "data", "result"];
const AREA_NAME: &[&str] = &["area_name", "area", "name", "county_name", "metro_name"];
const BR0: &[&str] = &["br0", "efficiency", "bedroom0", "fmr0"];
const BR1: &[&str] = &["br1", "one_bedroom", "one-bedroom", "bedroom1", "fmr1"];
const BR2: &[&str] = &["br2", "two_bedroom", "two-bedroom", "bedroom2", "fmr2"];
const BR3: &[&str] = &["br3", "three_bedroom", "three-bedroom", "bedroom3", "fmr3"];
const BR4: &[&str] = &["br4", "four_bedroom", "four-bedroom", "bedroom4", "fmr4"];

/// FMR lookup URL for a county FIPS and fiscal year
pub fn build_hud_fmr_url(fips: &str, year: i32, endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("fips", fips)
        .append_pair("year", &year.to_string());
    url
}

/// Pull the rent schedule out of whichever envelope HUD wrapped it in
pub fn transform_hud_fmr(json: &Value) -> Result<FmrRecord, NormalizeError> {
    if let Some(message) = error_envelope(json) {
        return Err(NormalizeError::UpstreamErrorBody(message));
    }

    let (record, schedule) = locate_record(json)
        .ok_or_else(|| NormalizeError::NotFound("no FMR record in response".to_string()))?;
    let fields = FieldTable::from_value(schedule);

    let fmr = FmrRecord {
        area_name: fields
            .string(AREA_NAME)
            .or_else(|| FieldTable::from_value(record).string(AREA_NAME))
            .unwrap_or_default(),
        br0: fields.coerced_number(BR0),
        br1: fields.coerced_number(BR1),
        br2: fields.coerced_number(BR2),
        br3: fields.coerced_number(BR3),
        br4: fields.coerced_number(BR4),
    };

    let has_rents = [fmr.br0, fmr.br1, fmr.br2, fmr.br3, fmr.br4]
        .iter()
        .any(Option::is_some);
    if fmr.area_name.is_empty() && !has_rents {
        return Err(NormalizeError::NotFound("FMR record has no area or rents".to_string()));
    }

    Ok(fmr)
}

/// Returns the record and the object holding its rent schedule
fn locate_record(json: &Value) -> Option<(&Value, &Value)> {
    let outer = FieldTable::from_value(json)
        .raw(RECORD)
        .or_else(|| json.as_array().and_then(|items| items.first()))
        .unwrap_or(json);
    let record = first_object(outer)?;

    // Metro areas carry one basicdata entry per ZIP; the first is the area-wide schedule
    match FieldTable::from_value(record).raw(&["basicdata"]) {
        Some(basic) => first_object(basic).map(|schedule| (record, schedule)),
        None => Some((record, record)),
    }
}

fn first_object(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(_) => Some(value),
        Value::Array(items) => items.first().filter(|v| v.is_object()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fmr_envelope() {
        let json = json!({ "fmr": { "area_name": "Yazoo County, MS", "fmr0": 570, "fmr1": 620, "fmr2": 790, "fmr3": 990, "fmr4": 1150 } });
        let out = transform_hud_fmr(&json).unwrap();
        assert_eq!(out.area_name, "Yazoo County, MS");
        assert_eq!(out.br2, Some(790.0));
        assert_eq!(out.br4, Some(1150.0));
    }

    #[test]
    fn test_hud_basicdata_shape() {
        let json = json!({
            "data": {
                "county_name": "Hinds County",
                "basicdata": {
                    "Efficiency": "812",
                    "One-Bedroom": 864,
                    "Two-Bedroom": 1035,
                    "Three-Bedroom": 1349
                }
            }
        });
        let out = transform_hud_fmr(&json).unwrap();
        assert_eq!(out.area_name, "Hinds County");
        assert_eq!(out.br0, Some(812.0));
        assert_eq!(out.br3, Some(1349.0));
        assert_eq!(out.br4, None);
    }

    #[test]
    fn test_array_and_root_records() {
        let json = json!([{ "area": "Area A", "br1": 700 }]);
        assert_eq!(transform_hud_fmr(&json).unwrap().area_name, "Area A");

        let json = json!({ "name": "Root Area", "br0": "n/a" });
        let out = transform_hud_fmr(&json).unwrap();
        assert_eq!(out.area_name, "Root Area");
        assert_eq!(out.br0, None);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        assert!(matches!(transform_hud_fmr(&json!(null)), Err(NormalizeError::NotFound(_))));
        assert!(matches!(transform_hud_fmr(&json!({ "data": [] })), Err(NormalizeError::NotFound(_))));
        assert!(matches!(transform_hud_fmr(&json!({ "unrelated": 1 })), Err(NormalizeError::NotFound(_))));
        assert!(matches!(
            transform_hud_fmr(&json!({ "error": "Invalid FIPS" })),
            Err(NormalizeError::UpstreamErrorBody(_))
        ));
    }

    #[test]
    fn test_build_url() {
        let endpoint = Url::parse("https://api.example/fmr").unwrap();
        let url = build_hud_fmr_url("28163", 2025, &endpoint);
        assert_eq!(url.as_str(), "https://api.example/fmr?fips=28163&year=2025");
    }
}

use super::NormalizeError;
use crate::core::fields::{coerce_number, scalar_to_string, FieldTable};
use crate::models::{LausPoint, LausSeries};
use serde_json::{json, Value};

const REQUEST_SUCCEEDED: &str = "REQUEST_SUCCEEDED";

/// County unemployment rate, not seasonally adjusted
///
/// `LAUCN{state2}{county3}0000000003`
pub fn to_series_id(county_fips: &str) -> String {
    let state = county_fips.get(0..2).unwrap_or(county_fips);
    let county = county_fips.get(2..5).unwrap_or("");
    format!("LAUCN{}{}0000000003", state, county)
}

/// POST body for the BLS timeseries API
pub fn build_bls_request_body(series_id: &str, start: i32, end: i32, api_key: Option<&str>) -> Value {
    let mut body = json!({
        "seriesid": [series_id],
        "startyear": start.to_string(),
        "endyear": end.to_string(),
    });
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        body["registrationkey"] = Value::String(key.to_string());
    }
    body
}

/// Message for a response whose `status` is present and not `REQUEST_SUCCEEDED`
pub fn bls_status_error(json: &Value) -> Option<String> {
    let status = json.get("status").and_then(Value::as_str)?;
    if status == REQUEST_SUCCEEDED {
        return None;
    }
    let detail = json
        .get("message")
        .and_then(Value::as_array)
        .and_then(|messages| messages.first())
        .and_then(scalar_to_string);
    Some(match detail {
        Some(detail) => format!("{}: {}", status, detail),
        None => status.to_string(),
    })
}

/// Monthly points for `want_series_id`, oldest first
///
/// Annual averages (`M13`) and non-monthly periods are dropped, as are
/// footnote-only values such as `"-"`.
pub fn normalize_bls_timeseries(json: &Value, want_series_id: &str) -> Result<LausSeries, NormalizeError> {
    if let Some(message) = bls_status_error(json) {
        return Err(NormalizeError::UpstreamErrorBody(message));
    }

    let empty = LausSeries {
        series_id: want_series_id.to_string(),
        adjusted: false,
        points: Vec::new(),
    };

    let series = match FieldTable::from_value(json)
        .raw(&["Results", "results"])
        .and_then(|results| results.get("series"))
        .and_then(Value::as_array)
    {
        Some(series) => series,
        None => return Ok(empty),
    };

    let found = series
        .iter()
        .find(|s| {
            FieldTable::from_value(s).string(&["seriesID", "seriesId"]).as_deref() == Some(want_series_id)
        })
        .or_else(|| series.first());

    let data = match found.and_then(|s| s.get("data")).and_then(Value::as_array) {
        Some(data) => data,
        None => return Ok(empty),
    };

    let mut points: Vec<LausPoint> = data.iter().filter_map(observation_to_point).collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));

    Ok(LausSeries { points, ..empty })
}

fn observation_to_point(observation: &Value) -> Option<LausPoint> {
    let month = observation
        .get("period")
        .and_then(Value::as_str)?
        .strip_prefix('M')?;
    if month == "13" || month.is_empty() {
        return None;
    }
    let year = observation.get("year").and_then(scalar_to_string)?;
    let value = observation.get("value").and_then(coerce_number)?;

    Some(LausPoint {
        date: format!("{}-{:0>2}", year, month),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIES: &str = "LAUCN281630000000003";

    #[test]
    fn test_series_id() {
        assert_eq!(to_series_id("28163"), SERIES);
        assert_eq!(to_series_id("01001"), "LAUCN010010000000003");
    }

    #[test]
    fn test_normalize_sorted_points() {
        let json = json!({
            "status": "REQUEST_SUCCEEDED",
            "Results": {
                "series": [{
                    "seriesID": SERIES,
                    "data": [
                        { "year": "2025", "period": "M02", "periodName": "February", "value": "9.1" },
                        { "year": "2025", "period": "M01", "periodName": "January", "value": "8.9" },
                        { "year": "2024", "period": "M13", "periodName": "Annual", "value": "8.2" },
                        { "year": "2024", "period": "M12", "periodName": "December", "value": "8.7" }
                    ]
                }]
            }
        });

        let out = normalize_bls_timeseries(&json, SERIES).unwrap();
        assert_eq!(out.series_id, SERIES);
        assert!(!out.adjusted);
        assert_eq!(
            out.points,
            vec![
                LausPoint { date: "2024-12".to_string(), value: 8.7 },
                LausPoint { date: "2025-01".to_string(), value: 8.9 },
                LausPoint { date: "2025-02".to_string(), value: 9.1 },
            ]
        );
    }

    #[test]
    fn test_series_selection_and_odd_values() {
        let json = json!({
            "results": {
                "series": [
                    { "seriesId": "OTHER", "data": [{ "year": 2020, "period": "M01", "value": "1.0" }] },
                    { "seriesId": SERIES, "data": [
                        { "year": 2021, "period": "M3", "value": "4.5" },
                        { "year": 2021, "period": "Q01", "value": "4.0" },
                        { "year": 2021, "period": "M04", "value": "-" }
                    ] }
                ]
            }
        });
        let out = normalize_bls_timeseries(&json, SERIES).unwrap();
        assert_eq!(out.points, vec![LausPoint { date: "2021-03".to_string(), value: 4.5 }]);

        // No match falls back to the first series
        let out = normalize_bls_timeseries(&json, "MISSING").unwrap();
        assert_eq!(out.series_id, "MISSING");
        assert_eq!(out.points[0].date, "2020-01");
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(normalize_bls_timeseries(&json!("oops"), SERIES).unwrap().points.is_empty());
        assert!(normalize_bls_timeseries(&json!({ "Results": { "series": [] } }), SERIES)
            .unwrap()
            .points
            .is_empty());

        let failed = json!({ "status": "REQUEST_NOT_PROCESSED", "message": ["daily threshold reached"] });
        assert_eq!(
            bls_status_error(&failed),
            Some("REQUEST_NOT_PROCESSED: daily threshold reached".to_string())
        );
        assert!(matches!(
            normalize_bls_timeseries(&failed, SERIES),
            Err(NormalizeError::UpstreamErrorBody(_))
        ));
    }

    #[test]
    fn test_request_body() {
        let body = build_bls_request_body(SERIES, 2020, 2024, Some("k3y"));
        assert_eq!(body["seriesid"][0], SERIES);
        assert_eq!(body["startyear"], "2020");
        assert_eq!(body["endyear"], "2024");
        assert_eq!(body["registrationkey"], "k3y");

        let body = build_bls_request_body(SERIES, 2020, 2024, None);
        assert!(body.get("registrationkey").is_none());
    }
}

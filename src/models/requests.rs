use crate::core::bbox::Bbox;
use crate::models::domain::{Contact, ResourceType, VerificationMethod};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// `GET /api/food/snap`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SnapQuery {
    #[validate(custom(function = "validate_bbox"))]
    pub bbox: String,
    /// Comma-separated store types
    pub types: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<i64>,
    pub debug: Option<String>,
}

/// `GET /api/housing/counselors`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CounselorsQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
    /// Miles
    #[serde(default, deserialize_with = "empty_as_none")]
    pub radius: Option<i64>,
    pub debug: Option<String>,
}

/// `GET /api/housing/fmr`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FmrQuery {
    #[validate(custom(function = "validate_county_fips"))]
    pub fips: String,
    #[validate(range(min = 1990, max = 2100))]
    pub year: i32,
    pub debug: Option<String>,
}

/// `GET /api/jobs/unemployment`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_year_order"))]
pub struct UnemploymentQuery {
    #[serde(rename = "countyFips")]
    #[validate(custom(function = "validate_county_fips"))]
    pub county_fips: String,
    #[validate(range(min = 1990, max = 2100))]
    pub start: i32,
    #[validate(range(min = 1990, max = 2100))]
    pub end: i32,
    pub debug: Option<String>,
}

/// `GET /api/broadband/summary`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BroadbandQuery {
    /// `county` (default) or `tract`
    pub geo: Option<String>,
    #[validate(custom(function = "validate_area_fips"))]
    pub fips: String,
}

/// `GET /api/resources`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResourceListQuery {
    #[validate(custom(function = "validate_bbox"))]
    pub bbox: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
    /// Presence alone selects the moderation queue
    pub queue: Option<String>,
}

/// `POST /api/resources`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub description: Option<String>,
    /// `[lon, lat]`
    #[validate(custom(function = "validate_coords"))]
    pub coords: [f64; 2],
    pub address: Option<String>,
    pub contact: Option<Contact>,
    pub hours: Option<String>,
}

/// `POST /api/resources/{id}/verify`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyResourceRequest {
    pub method: VerificationMethod,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub by: Option<String>,
}

/// `GET /api/geocode`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodeQuery {
    pub q: Option<String>,
    pub debug: Option<String>,
}

/// Numeric query value where `key=` means the same as leaving `key` out
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn validate_bbox(bbox: &str) -> Result<(), ValidationError> {
    Bbox::parse(bbox).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("bbox");
        err.message = Some(e.to_string().into());
        err
    })
}

fn validate_county_fips(fips: &str) -> Result<(), ValidationError> {
    if fips.len() == 5 && fips.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("fips_must_be_5_digits"))
    }
}

fn validate_area_fips(fips: &str) -> Result<(), ValidationError> {
    if (5..=11).contains(&fips.len()) && fips.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("fips_must_be_5_to_11_digits"))
    }
}

fn validate_coords(coords: &[f64; 2]) -> Result<(), ValidationError> {
    let [lon, lat] = *coords;
    if (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(ValidationError::new("coords_out_of_range"))
    }
}

fn validate_year_order(query: &UnemploymentQuery) -> Result<(), ValidationError> {
    if query.start <= query.end {
        Ok(())
    } else {
        let mut err = ValidationError::new("year_order");
        err.message = Some("start must be <= end".into());
        Err(err)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// SNAP-authorized retailer normalized from ArcGIS features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapItem {
    /// SHA-1 of `name|address|lon,lat`
    pub id: String,
    pub name: String,
    pub address: String,
    /// `[lon, lat]`
    pub coords: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_type: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
}

/// HUD-approved housing counseling agency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounselorItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    /// `[lon, lat]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<[f64; 2]>,
}

/// One month of a LAUS unemployment-rate series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LausPoint {
    /// `YYYY-MM`
    pub date: String,
    /// Percent
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LausSeries {
    pub series_id: String,
    pub adjusted: bool,
    pub points: Vec<LausPoint>,
}

/// Fair Market Rents by bedroom count; absent values stay `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmrRecord {
    pub area_name: String,
    pub br0: Option<f64>,
    pub br1: Option<f64>,
    pub br2: Option<f64>,
    pub br3: Option<f64>,
    pub br4: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    #[default]
    County,
    Tract,
}

impl GeoLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoLevel::County => "county",
            GeoLevel::Tract => "tract",
        }
    }
}

/// Advertised speed tiers available in an area (down/up Mbps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeedTiers {
    #[serde(rename = "25_3")]
    pub s25_3: bool,
    #[serde(rename = "100_20")]
    pub s100_20: bool,
    #[serde(rename = "1000_100")]
    pub s1000_100: bool,
}

/// Pre-aggregated FCC broadband availability for one area and release
#[derive(Debug, Clone, PartialEq)]
pub struct BroadbandSummary {
    pub geo_type: GeoLevel,
    pub fips: String,
    /// `YYYY-MM-DD`
    pub as_of: String,
    pub provider_count: i32,
    pub speed: SpeedTiers,
    pub tech: Vec<String>,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl BroadbandSummary {
    /// `YYYY-MM` release vintage
    pub fn data_vintage(&self) -> String {
        self.as_of.chars().take(7).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Wifi,
    FoodPantry,
    MealSite,
    Clinic,
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Wifi => "wifi",
            ResourceType::FoodPantry => "food_pantry",
            ResourceType::MealSite => "meal_site",
            ResourceType::Clinic => "clinic",
            ResourceType::Other => "other",
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wifi" => Ok(ResourceType::Wifi),
            "food_pantry" => Ok(ResourceType::FoodPantry),
            "meal_site" => Ok(ResourceType::MealSite),
            "clinic" => Ok(ResourceType::Clinic),
            "other" => Ok(ResourceType::Other),
            other => Err(format!("unknown resource type: {}", other)),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a moderator confirmed a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    Phone,
    Site,
    Email,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::Phone => "phone",
            VerificationMethod::Site => "site",
            VerificationMethod::Email => "email",
        }
    }
}

impl FromStr for VerificationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(VerificationMethod::Phone),
            "site" => Ok(VerificationMethod::Site),
            "email" => Ok(VerificationMethod::Email),
            other => Err(format!("unknown verification method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub by: String,
    pub at: DateTime<Utc>,
    pub method: VerificationMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

/// Community-submitted resource as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `[lon, lat]`
    pub coords: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(skip)]
    pub submitted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<Verification>,
    #[serde(skip)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields accepted when a resource is submitted
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    pub resource_type: ResourceType,
    pub name: String,
    pub description: Option<String>,
    pub coords: [f64; 2],
    pub address: Option<String>,
    pub contact: Option<Contact>,
    pub hours: Option<String>,
    pub submitted_by: Option<String>,
}

/// Listing filter for community resources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub bbox: Option<crate::core::Bbox>,
    pub resource_type: Option<ResourceType>,
    /// Moderation queue view: include unverified resources
    pub include_unverified: bool,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Verify,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Verify => "verify",
        }
    }
}

/// Append-only moderation trail entry
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAudit {
    pub resource_id: Uuid,
    pub action: AuditAction,
    pub by: String,
    pub at: DateTime<Utc>,
    pub method: Option<VerificationMethod>,
    pub notes: Option<String>,
}

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// WGS84 semi-major axis in meters, used by the spherical Web Mercator projection
pub const EARTH_RADIUS_M: f64 = 6378137.0;

/// Latitude limit before projecting; tan() diverges at the poles
const MAX_MERCATOR_LAT: f64 = 89.999999;

#[derive(Debug, Error, PartialEq)]
pub enum BboxError {
    #[error("bbox must have exactly 4 values, got {0}")]
    WrongCount(usize),

    #[error("bbox value is not a finite number: {0:?}")]
    NotNumeric(String),
}

/// Geographic bounding box `[minLon, minLat, maxLon, maxLat]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bbox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    /// Parse a comma-separated `minLon,minLat,maxLon,maxLat` string
    pub fn parse(input: &str) -> Result<Self, BboxError> {
        let parts: Vec<&str> = input.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxError::WrongCount(parts.len()));
        }

        let mut values = [0.0; 4];
        for (slot, raw) in values.iter_mut().zip(parts) {
            let trimmed = raw.trim();
            *slot = trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| BboxError::NotNumeric(trimmed.to_string()))?;
        }

        Ok(Self::from(values))
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// Serialize back to the `minLon,minLat,maxLon,maxLat` query form
    ///
    /// Uses the shortest round-trip float formatting, so `Bbox::parse` on the
    /// result yields the identical box.
    pub fn to_query_param(self) -> String {
        self.to_string()
    }

    /// Clamp each coordinate to the valid lon/lat range independently
    ///
    /// A degenerate box (min > max) stays degenerate.
    pub fn clamp_to_world(self) -> Self {
        Self {
            min_lon: self.min_lon.clamp(-180.0, 180.0),
            min_lat: self.min_lat.clamp(-90.0, 90.0),
            max_lon: self.max_lon.clamp(-180.0, 180.0),
            max_lat: self.max_lat.clamp(-90.0, 90.0),
        }
    }

    /// Center point as `(lon, lat)`
    pub fn centroid(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Inclusive point-in-box test for a `(lon, lat)` point
    #[inline]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

impl From<[f64; 4]> for Bbox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl TryFrom<&[f64]> for Bbox {
    type Error = BboxError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        let array: [f64; 4] = values
            .try_into()
            .map_err(|_| BboxError::WrongCount(values.len()))?;
        if let Some(bad) = array.iter().find(|v| !v.is_finite()) {
            return Err(BboxError::NotNumeric(bad.to_string()));
        }
        Ok(Self::from(array))
    }
}

impl FromStr for Bbox {
    type Err = BboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }
}

/// Input accepted by [`parse_bbox`]: a query string or an explicit list of numbers
pub enum BboxInput<'a> {
    Text(&'a str),
    Values(&'a [f64]),
}

impl<'a> From<&'a str> for BboxInput<'a> {
    fn from(s: &'a str) -> Self {
        BboxInput::Text(s)
    }
}

impl<'a> From<&'a [f64]> for BboxInput<'a> {
    fn from(v: &'a [f64]) -> Self {
        BboxInput::Values(v)
    }
}

pub fn parse_bbox<'a>(input: impl Into<BboxInput<'a>>) -> Result<Bbox, BboxError> {
    match input.into() {
        BboxInput::Text(s) => Bbox::parse(s),
        BboxInput::Values(v) => Bbox::try_from(v),
    }
}

/// Project geographic coordinates to spherical Web Mercator meters (EPSG:3857)
///
/// # Returns
/// `(x, y)` in meters
pub fn to_web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon.to_radians() * EARTH_RADIUS_M;
    let clamped_lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let y = (std::f64::consts::FRAC_PI_4 + clamped_lat.to_radians() / 2.0)
        .tan()
        .ln()
        * EARTH_RADIUS_M;
    (x, y)
}

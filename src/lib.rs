//! Civic Lifeline - civic data aggregation API
//!
//! Proxies, normalizes and caches government datasets (USDA SNAP retailers,
//! HUD housing counselors and Fair Market Rents, BLS unemployment) and serves
//! community-submitted resources with a moderation flow.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod sources;
pub mod telemetry;

// Re-export commonly used types
pub use crate::core::{hash_key, parse_bbox, Bbox, CacheKey, RetryPolicy};
pub use error::ApiError;
pub use routes::{configure_routes, AppState};

// Route exports
pub mod broadband;
pub mod food;
pub mod geocode;
pub mod health;
pub mod housing;
pub mod jobs;
pub mod pipeline;
pub mod resources;

use crate::core::retry::RetryPolicy;
use crate::error::ApiError;
use crate::services::cache::{CacheTtls, ResponseCache};
use crate::services::postgres::{BroadbandStore, ResourceStore};
use crate::services::upstream::{UpstreamClient, UpstreamEndpoints};
use crate::sources::EnvelopeSpatialRef;
use actix_web::{error, web, HttpRequest};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn ResponseCache>,
    pub upstream: Arc<UpstreamClient>,
    pub endpoints: Arc<UpstreamEndpoints>,
    /// Backoff shape; each route applies its own retry budget on top
    pub retry: RetryPolicy,
    pub ttls: CacheTtls,
    pub snap_spatial_ref: EnvelopeSpatialRef,
    pub resources: Arc<dyn ResourceStore>,
    pub broadband: Arc<dyn BroadbandStore>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .configure(health::configure)
        .service(
            web::scope("/api")
                .configure(food::configure)
                .configure(housing::configure)
                .configure(jobs::configure)
                .configure(broadband::configure)
                .configure(resources::configure)
                .configure(geocode::configure),
        );
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid query: {}", err)).into()
}

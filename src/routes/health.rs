use super::AppState;
use crate::models::HealthResponse;
use actix_web::{web, HttpResponse, Responder};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.resources.health_check().await.unwrap_or(false);
    let cache_healthy = match state.cache.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Cache ping failed: {}", e);
            false
        }
    };

    let status = if db_healthy && cache_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

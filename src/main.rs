use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use civic_lifeline::config::Settings;
use civic_lifeline::routes::{self, AppState};
use civic_lifeline::services::{CacheManager, CacheTtls, PostgresClient, UpstreamClient, UpstreamEndpoints};
use civic_lifeline::sources::EnvelopeSpatialRef;
use civic_lifeline::telemetry;
use std::io;
use std::sync::Arc;
use tracing::{error, info};

fn startup_error(what: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", what, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    telemetry::init_tracing(&settings.logging);
    info!("Starting Civic Lifeline API...");

    let endpoints = UpstreamEndpoints::from_settings(&settings.upstreams)
        .map_err(|e| startup_error("Invalid upstream configuration", e))?;

    let upstream = UpstreamClient::new(settings.upstreams.hud_token.clone())
        .map_err(|e| startup_error("Failed to build HTTP client", e))?;

    // Redis is optional; without it responses are cached in-process only
    let cache = CacheManager::new(settings.cache.redis_url.as_deref(), settings.cache.l1_cache_size).await;
    info!(
        "Cache manager initialized (L1: {} entries, Redis: {})",
        settings.cache.l1_cache_size,
        if cache.has_redis() { "connected" } else { "disabled" }
    );

    let postgres = Arc::new(
        PostgresClient::from_settings(&settings.database)
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );
    info!("PostgreSQL client initialized");

    let snap_spatial_ref = if settings.upstreams.snap_web_mercator {
        EnvelopeSpatialRef::WebMercator
    } else {
        EnvelopeSpatialRef::Wgs84
    };

    let app_state = AppState {
        cache: Arc::new(cache),
        upstream: Arc::new(upstream),
        endpoints: Arc::new(endpoints),
        retry: settings.retry.policy(),
        ttls: CacheTtls::from_settings(&settings.cache),
        snap_spatial_ref,
        resources: postgres.clone(),
        broadband: postgres,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

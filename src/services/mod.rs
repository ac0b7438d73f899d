// Service exports
pub mod cache;
pub mod postgres;
pub mod upstream;

pub use cache::{CacheError, CacheManager, CacheTtls, ResponseCache, TtlPolicy};
pub use postgres::{BroadbandStore, PostgresClient, PostgresError, ResourceStore};
pub use upstream::{Upstream, UpstreamClient, UpstreamEndpoints, UpstreamError};

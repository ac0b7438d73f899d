use crate::config::DatabaseSettings;
use crate::models::{
    AuditAction, BroadbandSummary, Contact, GeoLevel, NewResource, Resource, ResourceAudit, ResourceFilter,
    ResourceType, SpeedTiers, Verification,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Hard cap on listing size regardless of the requested limit
pub const MAX_RESOURCE_PAGE: i64 = 500;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Community resources and their moderation trail
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, PostgresError>;

    /// Insert an unverified resource and its `create` audit entry
    async fn create_resource(&self, resource: NewResource) -> Result<Uuid, PostgresError>;

    /// Record a verification and its `verify` audit entry
    ///
    /// Returns `false` when no resource has this id.
    async fn verify_resource(
        &self,
        id: Uuid,
        verification: &Verification,
        notes: Option<&str>,
    ) -> Result<bool, PostgresError>;

    async fn health_check(&self) -> Result<bool, PostgresError>;
}

/// Read side of the broadband table populated by the ingest job
#[async_trait]
pub trait BroadbandStore: Send + Sync {
    /// Newest release for an area
    async fn latest_summary(&self, geo: GeoLevel, fips: &str) -> Result<Option<BroadbandSummary>, PostgresError>;
}

/// PostgreSQL client for resources and broadband summaries
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn insert_audit<'e, E>(executor: E, audit: &ResourceAudit) -> Result<(), PostgresError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let query = r#"
            INSERT INTO resource_audits (resource_id, action, actor, at, method, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;

        sqlx::query(query)
            .bind(audit.resource_id)
            .bind(audit.action.as_str())
            .bind(&audit.by)
            .bind(audit.at)
            .bind(audit.method.map(|m| m.as_str()))
            .bind(&audit.notes)
            .execute(executor)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ResourceStore for PostgresClient {
    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, PostgresError> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, resource_type, name, description, lon, lat, address, contact, hours,
                   submitted_by, verified_by, verified_at, verified_method, created_at, updated_at
            FROM resources
            WHERE TRUE
            "#,
        );

        if !filter.include_unverified {
            query.push(" AND verified_at IS NOT NULL");
        }
        if let Some(resource_type) = filter.resource_type {
            query.push(" AND resource_type = ").push_bind(resource_type.as_str());
        }
        if let Some(bbox) = filter.bbox {
            query
                .push(" AND lon BETWEEN ")
                .push_bind(bbox.min_lon)
                .push(" AND ")
                .push_bind(bbox.max_lon)
                .push(" AND lat BETWEEN ")
                .push_bind(bbox.min_lat)
                .push(" AND ")
                .push_bind(bbox.max_lat);
        }

        let limit = filter.limit.clamp(1, MAX_RESOURCE_PAGE);
        query.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

        let rows = query.build().fetch_all(&self.pool).await?;
        let resources = rows.iter().map(row_to_resource).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Listed {} resources", resources.len());
        Ok(resources)
    }

    async fn create_resource(&self, resource: NewResource) -> Result<Uuid, PostgresError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let [lon, lat] = resource.coords;

        let mut tx = self.pool.begin().await?;

        let query = r#"
            INSERT INTO resources
                (id, resource_type, name, description, lon, lat, address, contact, hours,
                 submitted_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        "#;

        sqlx::query(query)
            .bind(id)
            .bind(resource.resource_type.as_str())
            .bind(&resource.name)
            .bind(&resource.description)
            .bind(lon)
            .bind(lat)
            .bind(&resource.address)
            .bind(resource.contact.as_ref().map(Json))
            .bind(&resource.hours)
            .bind(&resource.submitted_by)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let audit = ResourceAudit {
            resource_id: id,
            action: AuditAction::Create,
            by: resource.submitted_by.clone().unwrap_or_else(|| "anonymous".to_string()),
            at: now,
            method: None,
            notes: None,
        };
        Self::insert_audit(&mut *tx, &audit).await?;

        tx.commit().await?;

        tracing::debug!("Created resource {} ({})", id, resource.resource_type);
        Ok(id)
    }

    async fn verify_resource(
        &self,
        id: Uuid,
        verification: &Verification,
        notes: Option<&str>,
    ) -> Result<bool, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let query = r#"
            UPDATE resources
            SET verified_by = $1, verified_at = $2, verified_method = $3, updated_at = $2
            WHERE id = $4
        "#;

        let result = sqlx::query(query)
            .bind(&verification.by)
            .bind(verification.at)
            .bind(verification.method.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let audit = ResourceAudit {
            resource_id: id,
            action: AuditAction::Verify,
            by: verification.by.clone(),
            at: verification.at,
            method: Some(verification.method),
            notes: notes.map(str::to_string),
        };
        Self::insert_audit(&mut *tx, &audit).await?;

        tx.commit().await?;

        tracing::debug!("Verified resource {} by {}", id, verification.by);
        Ok(true)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl BroadbandStore for PostgresClient {
    async fn latest_summary(&self, geo: GeoLevel, fips: &str) -> Result<Option<BroadbandSummary>, PostgresError> {
        let query = r#"
            SELECT to_char(as_of, 'YYYY-MM-DD') AS as_of, provider_count,
                   speed_25_3, speed_100_20, speed_1000_100, tech, source, fetched_at
            FROM broadband_summaries
            WHERE geo_type = $1 AND fips = $2
            ORDER BY as_of DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(geo.as_str())
            .bind(fips)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<BroadbandSummary, PostgresError> {
            Ok(BroadbandSummary {
                geo_type: geo,
                fips: fips.to_string(),
                as_of: row.try_get("as_of")?,
                provider_count: row.try_get("provider_count")?,
                speed: SpeedTiers {
                    s25_3: row.try_get("speed_25_3")?,
                    s100_20: row.try_get("speed_100_20")?,
                    s1000_100: row.try_get("speed_1000_100")?,
                },
                tech: row.try_get("tech")?,
                source: row.try_get("source")?,
                fetched_at: row.try_get("fetched_at")?,
            })
        })
        .transpose()
    }
}

fn row_to_resource(row: &PgRow) -> Result<Resource, PostgresError> {
    let resource_type: String = row.try_get("resource_type")?;
    let resource_type = resource_type
        .parse::<ResourceType>()
        .map_err(PostgresError::InvalidData)?;

    let verified_by: Option<String> = row.try_get("verified_by")?;
    let verified_at: Option<DateTime<Utc>> = row.try_get("verified_at")?;
    let verified_method: Option<String> = row.try_get("verified_method")?;
    let verified = match (verified_by, verified_at, verified_method) {
        (Some(by), Some(at), Some(method)) => Some(Verification {
            by,
            at,
            method: method.parse().map_err(PostgresError::InvalidData)?,
        }),
        _ => None,
    };

    let contact: Option<Json<Contact>> = row.try_get("contact")?;

    Ok(Resource {
        id: row.try_get("id")?,
        resource_type,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        coords: [row.try_get("lon")?, row.try_get("lat")?],
        address: row.try_get("address")?,
        contact: contact.map(|c| c.0),
        hours: row.try_get("hours")?,
        submitted_by: row.try_get("submitted_by")?,
        verified,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

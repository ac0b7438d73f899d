use super::AppState;
use crate::core::bbox::Bbox;
use crate::error::ApiError;
use crate::models::{
    CreateResourceRequest, CreateResourceResponse, ItemsResponse, NewResource, ResourceFilter, ResourceListQuery,
    Verification, VerifyResourceRequest, VerifyResourceResponse,
};
use crate::services::postgres::MAX_RESOURCE_PAGE;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

pub const COMMUNITY_SOURCE: &str = "Community";
pub const QUEUE_SOURCE: &str = "Moderation Queue";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
const DEFAULT_MODERATOR: &str = "moderator@site";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/resources", web::get().to(list_resources))
        .route("/resources", web::post().to(create_resource))
        .route("/resources/{id}/verify", web::post().to(verify_resource));
}

fn user_email(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Verified community resources, or the moderation queue when `queue` is set
///
/// GET /api/resources?bbox=&type=&queue=
async fn list_resources(
    state: web::Data<AppState>,
    query: web::Query<ResourceListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate()?;

    let bbox = query
        .bbox
        .as_deref()
        .map(Bbox::parse)
        .transpose()?
        .map(Bbox::clamp_to_world);
    let queue = query.queue.is_some();

    let filter = ResourceFilter {
        bbox,
        resource_type: query.resource_type,
        include_unverified: queue,
        limit: MAX_RESOURCE_PAGE,
    };
    tracing::info!("Resources request: {:?}", filter);

    let items = state.resources.list_resources(&filter).await?;
    let source = if queue { QUEUE_SOURCE } else { COMMUNITY_SOURCE };

    Ok(HttpResponse::Ok().json(ItemsResponse::new(items, source)))
}

/// Submit a resource for moderation
///
/// POST /api/resources
async fn create_resource(
    state: web::Data<AppState>,
    body: web::Json<CreateResourceRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let resource = NewResource {
        resource_type: body.resource_type,
        name: body.name,
        description: body.description,
        coords: body.coords,
        address: body.address,
        contact: body.contact,
        hours: body.hours,
        submitted_by: user_email(&req),
    };

    let id = state.resources.create_resource(resource).await?;
    tracing::info!("Resource {} queued for moderation", id);

    Ok(HttpResponse::Created().json(CreateResourceResponse {
        id,
        status: "queued".to_string(),
    }))
}

/// Record a moderator's verification
///
/// POST /api/resources/{id}/verify
async fn verify_resource(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<VerifyResourceRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let id = Uuid::parse_str(&path.into_inner())
        .map_err(|e| ApiError::Validation(format!("Invalid resource id: {}", e)))?;
    let body = body.into_inner();
    body.validate()?;

    let verification = Verification {
        by: body
            .by
            .or_else(|| user_email(&req))
            .unwrap_or_else(|| DEFAULT_MODERATOR.to_string()),
        at: Utc::now(),
        method: body.method,
    };

    let found = state
        .resources
        .verify_resource(id, &verification, body.notes.as_deref())
        .await?;
    if !found {
        return Err(ApiError::NotFound);
    }

    tracing::info!("Resource {} verified by {} via {}", id, verification.by, verification.method.as_str());
    Ok(HttpResponse::Ok().json(VerifyResourceResponse { id, verified: verification }))
}

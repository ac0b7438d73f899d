// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AuditAction, BroadbandSummary, Contact, CounselorItem, FmrRecord, GeoLevel, GeocodeResult, LausPoint,
    LausSeries, NewResource, Resource, ResourceAudit, ResourceFilter, ResourceType, SnapItem, SpeedTiers,
    Verification, VerificationMethod,
};
pub use requests::{
    BroadbandQuery, CounselorsQuery, CreateResourceRequest, FmrQuery, GeocodeQuery, ResourceListQuery, SnapQuery,
    UnemploymentQuery, VerifyResourceRequest,
};
pub use responses::{
    BroadbandResponse, CreateResourceResponse, ErrorBody, ErrorResponse, FmrResponse, HealthResponse, ItemsResponse,
    UnemploymentResponse, VerifyResourceResponse,
};

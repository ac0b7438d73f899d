use crate::models::domain::{FmrRecord, LausSeries, SpeedTiers, Verification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Item listing with provenance, shared by the list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

impl<T> ItemsResponse<T> {
    pub fn new(items: Vec<T>, source: impl Into<String>) -> Self {
        Self {
            items,
            source: source.into(),
            last_updated: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmrResponse {
    pub year: i32,
    #[serde(flatten)]
    pub fmr: FmrRecord,
    pub source: String,
    pub last_updated: DateTime<Utc>,
    pub data_vintage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnemploymentResponse {
    #[serde(flatten)]
    pub series: LausSeries,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadbandResponse {
    pub provider_count: i32,
    pub speed: SpeedTiers,
    pub tech: Vec<String>,
    pub as_of: String,
    pub source: String,
    pub last_updated: DateTime<Utc>,
    pub data_vintage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceResponse {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResourceResponse {
    pub id: Uuid,
    pub verified: Verification,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error envelope: `{"error": {"code": ..}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: None,
                upstream: None,
                detail: None,
            },
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error.message = Some(message.into());
        self
    }

    pub fn with_upstream(mut self, upstream: impl Into<String>) -> Self {
        self.error.upstream = Some(upstream.into());
        self
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.error.detail = detail;
        self
    }
}

use crate::config::UpstreamSettings;
use crate::core::retry::{run_with_retry, AttemptOutcome, RetryPolicy, Sleeper, TokioSleeper};
use crate::sources::geocode::USER_AGENT;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Inspects a decoded body for an in-band error; `Some(message)` fails the attempt
pub type BodyCheck = fn(&Value) -> Option<String>;

/// Errors from a single upstream attempt; the last one survives the retry loop
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("error body: {0}")]
    ErrorBody(String),

    #[error("undecodable body: {0}")]
    Decode(String),

    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
}

/// Third-party data providers, labelled as they appear in error envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Usda,
    Hud,
    Bls,
    Nominatim,
}

impl Upstream {
    pub fn label(&self) -> &'static str {
        match self {
            Upstream::Usda => "USDA",
            Upstream::Hud => "HUD",
            Upstream::Bls => "BLS",
            Upstream::Nominatim => "Nominatim",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parsed upstream base URLs and credentials
#[derive(Debug, Clone)]
pub struct UpstreamEndpoints {
    pub snap: Url,
    pub hud_counselors: Url,
    pub hud_fmr: Url,
    pub bls: Url,
    pub nominatim: Url,
    pub bls_api_key: Option<String>,
}

impl UpstreamEndpoints {
    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        let parse = |raw: &str| {
            Url::parse(raw.trim()).map_err(|e| UpstreamError::InvalidEndpoint(format!("{}: {}", raw, e)))
        };
        Ok(Self {
            snap: parse(&settings.snap_url)?,
            hud_counselors: parse(&settings.hud_counselors_url)?,
            hud_fmr: parse(&settings.hud_fmr_url)?,
            bls: parse(&settings.bls_url)?,
            nominatim: parse(&settings.nominatim_url)?,
            bls_api_key: settings.bls_api_key.clone().filter(|k| !k.is_empty()),
        })
    }
}

/// JSON-over-HTTP client shared by every data route
///
/// Each logical call runs its own retry loop; attempts are bounded by the
/// policy timeout, which drops the in-flight request on expiry.
pub struct UpstreamClient {
    client: Client,
    sleeper: Arc<dyn Sleeper>,
    hud_token: Option<String>,
}

impl UpstreamClient {
    pub fn new(hud_token: Option<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            hud_token: hud_token.filter(|t| !t.is_empty()),
        })
    }

    /// Replace the backoff sleeper (tests use a no-op)
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub async fn get_json(
        &self,
        upstream: Upstream,
        url: &Url,
        policy: &RetryPolicy,
        check: BodyCheck,
    ) -> Result<Value, UpstreamError> {
        run_with_retry(policy, self.sleeper.as_ref(), move |attempt| {
            let request = self.request(upstream, self.client.get(url.clone()));
            self.attempt(upstream, request, policy, check, attempt)
        })
        .await
    }

    pub async fn post_json(
        &self,
        upstream: Upstream,
        url: &Url,
        body: &Value,
        policy: &RetryPolicy,
        check: BodyCheck,
    ) -> Result<Value, UpstreamError> {
        run_with_retry(policy, self.sleeper.as_ref(), move |attempt| {
            let request = self.request(upstream, self.client.post(url.clone()).json(body));
            self.attempt(upstream, request, policy, check, attempt)
        })
        .await
    }

    fn request(&self, upstream: Upstream, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(ACCEPT, "application/json");
        match (upstream, &self.hud_token) {
            (Upstream::Hud, Some(token)) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            _ => builder,
        }
    }

    async fn attempt(
        &self,
        upstream: Upstream,
        request: RequestBuilder,
        policy: &RetryPolicy,
        check: BodyCheck,
        attempt: u32,
    ) -> AttemptOutcome<Value, UpstreamError> {
        let result = match tokio::time::timeout(policy.timeout, fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(policy.timeout)),
        };

        let err = match result {
            Ok(json) => match check(&json) {
                None => return AttemptOutcome::Success(json),
                Some(message) => UpstreamError::ErrorBody(message),
            },
            Err(err) => err,
        };

        tracing::warn!("{} attempt {} failed: {}", upstream, attempt + 1, err);

        match err {
            UpstreamError::Status(status) if !policy.is_retryable_status(status) => AttemptOutcome::Fatal(err),
            err => AttemptOutcome::Retryable(err),
        }
    }
}

async fn fetch(request: RequestBuilder) -> Result<Value, UpstreamError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status(status.as_u16()));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
}

/// Body check for upstreams without an in-band error convention
pub fn no_body_check(_: &Value) -> Option<String> {
    None
}

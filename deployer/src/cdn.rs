//! Best-effort CDN cache purge for freshly published URLs.
//!
//! Every failure here is logged as a warning and reported as `false`; the
//! release still succeeds.

use crate::config::CdnCredentials;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Base URL of the Cloudflare v4 API.
const API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Network timeout for the purge request.
const PURGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors arising from the purge transport.
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    /// The HTTP request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Request {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },
}

/// Sends JSON requests to the CDN API.
///
/// Abstracted so that tests can observe requests without network access.
#[cfg_attr(test, mockall::automock)]
pub trait PurgeTransport {
    /// POST `body` as JSON to `url` with a bearer token and return the
    /// response body, whatever the HTTP status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the body cannot be
    /// read.
    fn post_json(&self, url: &str, bearer: &str, body: &str) -> Result<String, PurgeError>;
}

/// HTTP transport using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl PurgeTransport for UreqTransport {
    fn post_json(&self, url: &str, bearer: &str, body: &str) -> Result<String, PurgeError> {
        let request_error = |reason: String| PurgeError::Request {
            url: url.to_owned(),
            reason,
        };
        let response = http_agent()
            .post(url)
            .header("Authorization", format!("Bearer {bearer}"))
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| request_error(e.to_string()))?;
        log::debug!("purge request answered with HTTP {}", response.status());
        response
            .into_body()
            .read_to_string()
            .map_err(|e| request_error(e.to_string()))
    }
}

/// Shared `ureq` agent. Error statuses are returned as responses so that the
/// API's JSON error body can be inspected.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(PURGE_TIMEOUT))
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Request body of the purge endpoint.
#[derive(Debug, Serialize)]
struct PurgeRequest<'a> {
    files: &'a [String],
}

/// The parts of the API response envelope this module reads.
#[derive(Debug, Deserialize)]
struct PurgeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

/// What a purge attempt amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// No CDN credentials are configured; nothing was sent.
    Skipped,
    /// The CDN confirmed the purge.
    Purged,
    /// The purge did not go through; the release is unaffected.
    Failed {
        /// Why the purge failed.
        reason: String,
    },
}

impl PurgeOutcome {
    /// Whether the CDN confirmed the purge.
    #[must_use]
    pub fn is_purged(&self) -> bool {
        matches!(self, Self::Purged)
    }
}

/// Purge endpoint for a zone.
///
/// # Examples
///
/// ```
/// use streameee_deployer::cdn::purge_endpoint;
///
/// assert_eq!(
///     purge_endpoint("abc"),
///     "https://api.cloudflare.com/client/v4/zones/abc/purge_cache"
/// );
/// ```
#[must_use]
pub fn purge_endpoint(zone_id: &str) -> String {
    format!("{API_BASE}/zones/{zone_id}/purge_cache")
}

/// Purges cached copies of published URLs.
pub struct CacheInvalidator<'a> {
    credentials: Option<CdnCredentials>,
    transport: &'a dyn PurgeTransport,
}

impl<'a> CacheInvalidator<'a> {
    /// Create an invalidator. Without credentials every purge is skipped.
    #[must_use]
    pub fn new(credentials: Option<CdnCredentials>, transport: &'a dyn PurgeTransport) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    /// Purge `urls` and report whether the CDN confirmed it.
    #[must_use]
    pub fn purge(&self, urls: &[String]) -> bool {
        self.purge_outcome(urls).is_purged()
    }

    /// Purge `urls` and report the detailed outcome.
    pub fn purge_outcome(&self, urls: &[String]) -> PurgeOutcome {
        let Some(credentials) = &self.credentials else {
            log::info!("CDN credentials not configured; skipping cache purge");
            return PurgeOutcome::Skipped;
        };

        let outcome = self.send(credentials, urls);
        match &outcome {
            PurgeOutcome::Purged => log::info!("purged {} URL(s) from CDN cache", urls.len()),
            PurgeOutcome::Failed { reason } => log::warn!("CDN cache purge failed: {reason}"),
            PurgeOutcome::Skipped => {}
        }
        outcome
    }

    fn send(&self, credentials: &CdnCredentials, urls: &[String]) -> PurgeOutcome {
        let body = match serde_json::to_string(&PurgeRequest { files: urls }) {
            Ok(body) => body,
            Err(e) => {
                return PurgeOutcome::Failed {
                    reason: format!("cannot encode request: {e}"),
                };
            }
        };
        let endpoint = purge_endpoint(&credentials.zone_id);

        let raw = match self
            .transport
            .post_json(&endpoint, credentials.api_token(), &body)
        {
            Ok(raw) => raw,
            Err(e) => {
                return PurgeOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        match serde_json::from_str::<PurgeResponse>(&raw) {
            Ok(response) if response.success => PurgeOutcome::Purged,
            Ok(response) => PurgeOutcome::Failed {
                reason: response
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .find(|m| !m.is_empty())
                    .unwrap_or_else(|| "unknown error".to_owned()),
            },
            Err(e) => PurgeOutcome::Failed {
                reason: format!("unreadable response: {e}"),
            },
        }
    }
}

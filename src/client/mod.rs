//! HTTP client for the GoCD REST API.
//!
//! Every operation performs exactly one HTTP round trip and returns an
//! [`ApiResponse`] holding the decoded body, the status code and the
//! version token (`ETag`). A 404 on a keyed lookup or delete is not an
//! error: it comes back as an `ApiResponse` whose [`ApiResponse::is_not_found`]
//! is true and whose body is empty.
//!
//! # Example
//!
//! ```no_run
//! use gocd_provider::{Config, GocdClient};
//!
//! # async fn example() -> gocd_provider::Result<()> {
//! let config = Config {
//!     server: Some("https://ci.example.com".to_string()),
//!     ..Default::default()
//! };
//! let client = GocdClient::new(&config)?;
//!
//! let response = client.pipeline_configs().get("build").await?;
//! if response.is_not_found() {
//!     println!("no such pipeline");
//! } else if let Some(pipeline) = response.body() {
//!     println!("{} at version {:?}", pipeline.name, pipeline.version);
//! }
//! # Ok(())
//! # }
//! ```

mod agents;
mod jobs;
mod pipeline_configs;
mod pipelines;
mod templates;

pub use agents::Agents;
pub use jobs::Jobs;
pub use pipeline_configs::PipelineConfigs;
pub use pipelines::Pipelines;
pub use templates::Templates;

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, ETAG, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};

pub(crate) const ACCEPT_V1: &str = "application/vnd.go.cd.v1+json";
pub(crate) const ACCEPT_V4: &str = "application/vnd.go.cd.v4+json";
pub(crate) const ACCEPT_V6: &str = "application/vnd.go.cd.v6+json";
pub(crate) const ACCEPT_XML: &str = "application/xml";

/// Header GoCD requires on state-changing POSTs without a body schema.
pub(crate) const CONFIRM_HEADER: &str = "X-GoCD-Confirm";

/// Maximum length of a response body written to the log.
const MAX_LOG_BODY_LENGTH: usize = 200;

/// The outcome of a single API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    status: u16,
    etag: Option<String>,
    body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Build a response by hand, mostly useful in tests.
    pub fn new(status: u16, etag: Option<String>, body: Option<T>) -> Self {
        Self { status, etag, body }
    }

    /// A not-found response with no body.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND.as_u16(), None, None)
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Version token from the `ETag` header, quotes removed.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Returns true if the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }

    /// The decoded body, absent for not-found responses.
    pub fn body(&self) -> Option<&T> {
        self.body.as_ref()
    }

    /// Consume the response, returning the body.
    pub fn into_body(self) -> Option<T> {
        self.body
    }

    /// Transform the body, keeping status and version token.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            etag: self.etag,
            body: self.body.map(f),
        }
    }
}

/// How a 404 answer is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnMissing {
    /// Return a not-found [`ApiResponse`].
    Allow,
    /// Return [`Error::NotFound`].
    Fail,
}

/// A response whose body has not been decoded yet.
pub(crate) struct RawResponse {
    status: StatusCode,
    etag: Option<String>,
    body: String,
}

impl RawResponse {
    pub(crate) fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Decode the body as JSON. Not-found responses decode to no body.
    pub(crate) fn json<T: DeserializeOwned>(self) -> Result<ApiResponse<T>> {
        if self.is_not_found() {
            return Ok(ApiResponse::new(self.status.as_u16(), None, None));
        }
        if self.body.trim().is_empty() {
            return Ok(ApiResponse::new(self.status.as_u16(), self.etag, None));
        }
        let body = serde_json::from_str(&self.body)?;
        Ok(ApiResponse::new(self.status.as_u16(), self.etag, Some(body)))
    }

    pub(crate) fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub(crate) fn text(&self) -> &str {
        &self.body
    }
}

/// Client for one GoCD server.
#[derive(Debug, Clone)]
pub struct GocdClient {
    /// Base URL ending in `/go`, without a trailing slash.
    base_url: String,
    http: Client,
    username: Option<String>,
    password: Option<String>,
}

impl GocdClient {
    /// Create a client from connection settings.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("gocd-provider/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs()))
            .danger_accept_invalid_certs(config.skip_ssl_check)
            .build()?;

        let mut client = Self::with_client(config.base_url()?, http);
        if let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) {
            client = client.with_basic_auth(username, config.password.clone().unwrap_or_default());
        }
        Ok(client)
    }

    /// Create a client around a preconfigured `reqwest::Client`.
    ///
    /// `base_url` is used as given, apart from trailing slashes.
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            username: None,
            password: None,
        }
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pipeline configuration endpoints.
    pub fn pipeline_configs(&self) -> PipelineConfigs<'_> {
        PipelineConfigs::new(self)
    }

    /// Pipeline template endpoints.
    pub fn templates(&self) -> Templates<'_> {
        Templates::new(self)
    }

    /// Pipeline runtime endpoints (status, pause, unpause).
    pub fn pipelines(&self) -> Pipelines<'_> {
        Pipelines::new(self)
    }

    /// Agent endpoints.
    pub fn agents(&self) -> Agents<'_> {
        Agents::new(self)
    }

    /// Job endpoints.
    pub fn jobs(&self) -> Jobs<'_> {
        Jobs::new(self)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    pub(crate) fn request(&self, method: Method, path: &str, accept: &'static str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static(accept));
        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_ref());
        }
        builder
    }

    pub(crate) fn request_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        accept: &'static str,
        body: &B,
    ) -> RequestBuilder {
        self.request(method, path, accept).json(body)
    }

    /// Send a request and check its status.
    pub(crate) async fn execute(&self, request: RequestBuilder, on_missing: OnMissing) -> Result<RawResponse> {
        let request = request.build()?;
        debug!(method = %request.method(), url = %request.url(), "Sending request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(parse_etag);
        let body = response.text().await?;

        debug!(status = status.as_u16(), "Received response");

        if status.is_success() {
            return Ok(RawResponse { status, etag, body });
        }

        let message = error_message(status, &body);
        match status {
            StatusCode::NOT_FOUND if on_missing == OnMissing::Allow => {
                debug!("Entity not found");
                Ok(RawResponse { status, etag: None, body })
            },
            StatusCode::NOT_FOUND => Err(Error::NotFound(message)),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                warn!(status = status.as_u16(), body = %sanitize_for_log(&body), "Version conflict");
                Err(Error::conflict(status.as_u16(), message))
            },
            _ => {
                warn!(status = status.as_u16(), body = %sanitize_for_log(&body), "API error");
                Err(Error::api(status.as_u16(), message))
            },
        }
    }
}

/// Add an `If-Match` header carrying a version token.
pub(crate) fn if_match(request: RequestBuilder, version: &str) -> RequestBuilder {
    request.header(IF_MATCH, format!("\"{}\"", version))
}

/// Strip weak-validator prefix and quotes from an `ETag` value.
pub(crate) fn parse_etag(raw: &str) -> String {
    raw.trim().trim_start_matches("W/").trim_matches('"').to_string()
}

/// Require a non-empty version token before an update.
pub(crate) fn require_version(version: Option<&str>) -> Result<&str> {
    version
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::validation(crate::error::EMPTY_VERSION))
}

/// Require a non-empty entity name before any request.
pub(crate) fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(Error::empty_name())
    } else {
        Ok(())
    }
}

/// Extract a readable message from an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

/// Truncate bodies and drop control characters before logging.
fn sanitize_for_log(body: &str) -> String {
    let truncated: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
    let mut sanitized: String = truncated
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    if body.chars().count() > MAX_LOG_BODY_LENGTH {
        sanitized.push_str(&format!("... [truncated, {} bytes total]", body.len()));
    }
    sanitized
}

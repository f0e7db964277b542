//! Form-encoded POST client
//!
//! This module performs single POST requests against the licensing service:
//! - Building HTTP clients from the client configuration
//! - Sending flat key/value payloads as form bodies
//! - Classifying transport failures and folding them into `None`

use crate::config::ClientConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Flat key/value request payload, sent form-encoded in insertion order
pub type Payload = Vec<(&'static str, String)>;

/// A reply that made it through the transport layer
#[derive(Debug, Clone)]
pub struct RestResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl RestResponse {
    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Transport-level failure kinds
///
/// These never cross the client boundary; they only feed the debug log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Connect,
    Body,
    Request,
}

impl TransportFailure {
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect
        } else if error.is_body() || error.is_decode() {
            Self::Body
        } else {
            Self::Request
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connection error",
            Self::Body => "malformed response",
            Self::Request => "request error",
        };
        f.write_str(text)
    }
}

/// Builds an HTTP client with the configured timeouts and user agent
///
/// `verify_tls` decides whether server certificates are checked.
pub fn build_http_client(config: &ClientConfig, verify_tls: bool) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .danger_accept_invalid_certs(!verify_tls)
        .gzip(true)
        .brotli(true)
        .build()
}

/// POST client shared by every fetch of a crawl run
///
/// Holds one verifying and one non-verifying `reqwest::Client` so the
/// certificate flag can be chosen per request. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct RestClient {
    verifying: Client,
    lenient: Client,
    verify_by_default: bool,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            verifying: build_http_client(config, true)?,
            lenient: build_http_client(config, false)?,
            verify_by_default: config.verify_tls,
        })
    }

    /// POSTs `payload` to `url` with the configured certificate policy
    pub async fn post_form(&self, url: &str, payload: &Payload) -> Option<RestResponse> {
        self.post(url, payload, self.verify_by_default).await
    }

    /// POSTs `payload` to `url`
    ///
    /// Returns `None` on any transport failure (connect error, timeout,
    /// unreadable body). HTTP error statuses are still responses and are
    /// returned as such; no retries are attempted.
    pub async fn post(&self, url: &str, payload: &Payload, verify: bool) -> Option<RestResponse> {
        let client = if verify { &self.verifying } else { &self.lenient };

        let response = match client.post(url).form(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    "POST {} failed with {}: {}",
                    url,
                    TransportFailure::classify(&e),
                    e
                );
                return None;
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Some(RestResponse { status, body }),
            Err(e) => {
                tracing::debug!(
                    "Reading body from {} failed with {}: {}",
                    url,
                    TransportFailure::classify(&e),
                    e
                );
                None
            }
        }
    }
}

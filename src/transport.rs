//! HTTP transport module.
//!
//! [`Transport`] is the seam between the client and the network. The
//! production implementation, [`HttpTransport`], performs one blocking
//! POST per call with a reqwest client that lives only for that call, so
//! the connection is released on every exit path when it is dropped.

use std::error::Error as StdError;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, warn};

use crate::server::Endpoint;
use crate::tls::pinned_client_config;

/// Status code and body returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer: no status code was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client or its TLS configuration could not be built
    #[error("failed to set up HTTP client: {0}")]
    Setup(String),

    /// DNS resolution, TCP connect or TLS handshake failed
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    /// Sending the request or reading the response failed
    #[error("HTTP request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(describe(&err))
        } else if err.is_builder() {
            TransportError::Setup(describe(&err))
        } else {
            TransportError::Request(describe(&err))
        }
    }
}

impl From<rustls::Error> for TransportError {
    fn from(err: rustls::Error) -> Self {
        TransportError::Setup(err.to_string())
    }
}

/// Flatten an error and its sources into one line.
fn describe(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Performs a single JSON POST and returns what the server answered.
pub trait Transport {
    fn post_json(&self, endpoint: &Endpoint, body: String) -> Result<Reply, TransportError>;
}

/// Blocking HTTP(S) transport backed by reqwest.
///
/// Must not be called from inside an async runtime worker; wrap calls in
/// `tokio::task::spawn_blocking` there.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }

    fn build_client(&self, endpoint: &Endpoint) -> Result<Client, TransportError> {
        let builder = Client::builder().no_proxy();

        let builder = match &endpoint.pin {
            Some(fingerprint) => {
                builder.use_preconfigured_tls(pinned_client_config(fingerprint.clone())?)
            }
            None => builder,
        };

        builder
            .build()
            .map_err(|e| TransportError::Setup(describe(&e)))
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, endpoint: &Endpoint, body: String) -> Result<Reply, TransportError> {
        let client = self.build_client(endpoint)?;

        debug!(url = %endpoint.url, bytes = body.len(), "Posting JSON payload");

        let response = client
            .post(&endpoint.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status().as_u16();
        // A status line arrived, so a body that cannot be read is left for
        // the JSON parse to reject.
        let body = response.text().unwrap_or_else(|e| {
            warn!(status, error = %describe(&e), "Failed to read response body");
            String::new()
        });

        Ok(Reply { status, body })
    }
}

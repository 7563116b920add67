//! Transport client module for the Breezo ingestion API.
//!
//! [`Breezo`] owns the credentials and server configuration, serializes a
//! [`ReadingSet`] into the request body, performs one blocking POST and
//! decodes the reply into a [`Response`]. Every failure is folded into the
//! response: `send` never returns an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::reading::ReadingSet;
use crate::server::{Endpoint, ServerConfig};
use crate::transport::{HttpTransport, Transport};

/// Message used when the reply body is not valid JSON.
pub const PARSE_ERROR_MESSAGE: &str = "Failed to parse response JSON";

/// Outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    Ok,
    #[default]
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Error => write!(f, "ERROR"),
        }
    }
}

/// Typed result of [`Breezo::send`].
///
/// The default value is an `Error` with empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    pub status: Status,

    /// Server-assigned id of the stored readings
    pub id: String,

    /// Human-readable message from the server or the transport
    pub message: String,

    /// Air-quality summary, empty if the server sent none
    pub air_quality: String,
}

impl Response {
    /// An `Error` response carrying only a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Decode a reply body.
    ///
    /// `status` must be exactly `"OK"` for success. Missing or non-string
    /// fields read as empty strings.
    pub fn from_body(body: &str) -> Self {
        let json: Value = match serde_json::from_str(body) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Response body is not valid JSON");
                return Self::error(PARSE_ERROR_MESSAGE);
            }
        };

        let field = |name: &str| -> String {
            json.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let status = if json.get("status").and_then(Value::as_str) == Some("OK") {
            Status::Ok
        } else {
            Status::Error
        };

        Self {
            status,
            id: field("id"),
            message: field("message"),
            air_quality: field("air_quality"),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Request body sent to the ingestion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Payload<'a> {
    pub access_token: &'a str,
    pub client_id: &'a str,
    pub client_name: &'a str,
    pub lat: f64,
    pub long: f64,
    pub alt: f64,
    pub readings: &'a BTreeMap<String, f64>,
}

/// Client for the Breezo ingestion API.
///
/// Credentials are forwarded verbatim in every request body. The client
/// holds no connection between calls; each [`send`](Breezo::send) opens
/// and releases its own.
///
/// # Example
///
/// ```no_run
/// use breezo_client::client::Breezo;
/// use breezo_client::reading::TempUnit;
/// use breezo_client::server::ServerConfig;
///
/// let breezo = Breezo::new(
///     "token",
///     "station-42",
///     "Rooftop station",
///     ServerConfig::new("ingest.example.org"),
/// );
///
/// let mut readings = breezo.new_reading_set();
/// readings.add_temperature("outdoor", 71.6, TempUnit::Fahrenheit);
/// readings.set_location(52.37, 4.89, 12.0);
///
/// let response = breezo.send(&readings);
/// if response.is_ok() {
///     println!("stored as {} ({})", response.id, response.air_quality);
/// } else {
///     eprintln!("rejected: {}", response.message);
/// }
/// ```
#[derive(Clone)]
pub struct Breezo<T = HttpTransport> {
    access_token: String,
    client_id: String,
    client_name: String,
    server: ServerConfig,
    transport: T,
}

impl<T: fmt::Debug> fmt::Debug for Breezo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breezo")
            .field("access_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_name", &self.client_name)
            .field("server", &self.server)
            .field("transport", &self.transport)
            .finish()
    }
}

impl Breezo<HttpTransport> {
    /// Create a client that talks HTTP(S) through reqwest.
    pub fn new(
        access_token: impl Into<String>,
        client_id: impl Into<String>,
        client_name: impl Into<String>,
        server: ServerConfig,
    ) -> Self {
        Self::with_transport(access_token, client_id, client_name, server, HttpTransport::new())
    }
}

impl<T: Transport> Breezo<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(
        access_token: impl Into<String>,
        client_id: impl Into<String>,
        client_name: impl Into<String>,
        server: ServerConfig,
        transport: T,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            client_id: client_id.into(),
            client_name: client_name.into(),
            server,
            transport,
        }
    }

    /// Start an empty reading set.
    pub fn new_reading_set(&self) -> ReadingSet {
        ReadingSet::new()
    }

    /// Build the request body for `readings`.
    pub fn payload<'a>(&'a self, readings: &'a ReadingSet) -> Payload<'a> {
        let location = readings.location();
        Payload {
            access_token: &self.access_token,
            client_id: &self.client_id,
            client_name: &self.client_name,
            lat: location.lat,
            long: location.lng,
            alt: location.alt,
            readings: readings.readings(),
        }
    }

    /// Serialize the request body for `readings` to JSON.
    pub fn body(&self, readings: &ReadingSet) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload(readings))
    }

    /// Send `readings` to the server and decode the reply.
    ///
    /// Blocks until the round-trip completes. Transport failures, bodies
    /// that are not JSON and application rejections all come back as a
    /// [`Status::Error`] response.
    pub fn send(&self, readings: &ReadingSet) -> Response {
        let endpoint = self.server.endpoint();

        let body = match self.body(readings) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize request");
                return Response::error(format!("Failed to serialize request JSON: {}", e));
            }
        };

        debug!(
            url = %endpoint.url,
            readings = readings.len(),
            pinned = endpoint.pin.is_some(),
            "Sending readings"
        );

        self.round_trip(&endpoint, body)
    }

    fn round_trip(&self, endpoint: &Endpoint, body: String) -> Response {
        let reply = match self.transport.post_json(endpoint, body) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, url = %endpoint.url, "Transport failure");
                return Response::error(e.to_string());
            }
        };

        if !reply.is_success() {
            warn!(status = reply.status, "Server answered with non-success status");
        }

        let response = Response::from_body(&reply.body);

        match response.status {
            Status::Ok => info!(
                id = %response.id,
                air_quality = %response.air_quality,
                "Readings accepted"
            ),
            Status::Error => warn!(
                http_status = reply.status,
                message = %response.message,
                "Readings rejected"
            ),
        }

        response
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

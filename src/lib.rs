//! Breezo Client Library
//!
//! This library collects environmental sensor readings and ships them to a
//! Breezo ingestion server as one JSON document per request:
//!
//! - **reading**: Unit-normalizing collector for temperature, concentration and ratio readings
//! - **server**: Server address, certificate fingerprint and scheme selection
//! - **transport**: Blocking HTTP(S) POST behind a `Transport` trait
//! - **tls**: Certificate pinning for `https` endpoints
//! - **client**: Request serialization and response decoding
//! - **config**: Environment-based configuration for the station binary
//! - **simulator**: Simulated sensors for running without hardware
//!
//! # Example
//!
//! ```no_run
//! use breezo_client::{Breezo, ConcentrationUnit, ServerConfig, TempUnit};
//!
//! let server = ServerConfig::new("ingest.example.org")
//!     .with_fingerprint("AB:CD:EF:01:23:45:67:89:AB:CD:EF:01:23:45:67:89:AB:CD:EF:01".parse().unwrap());
//! let breezo = Breezo::new("token", "station-42", "Rooftop station", server);
//!
//! let mut readings = breezo.new_reading_set();
//! readings.add_temperature("outdoor", 68.0, TempUnit::Fahrenheit);
//! readings.add_concentration("no2", 35.0, ConcentrationUnit::Ppb);
//! readings.add_ratio("humidity", 0.55);
//! readings.set_location(52.37, 4.89, 12.0);
//!
//! let response = breezo.send(&readings);
//! println!("{}: {}", response.status, response.message);
//! ```

// Module declarations
pub mod client;
pub mod config;
pub mod reading;
pub mod server;
pub mod simulator;
pub mod tls;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use client::{Breezo, Payload, Response, Status, PARSE_ERROR_MESSAGE};
pub use config::{Config, ConfigError};
pub use reading::{ConcentrationUnit, Location, Reading, ReadingSet, TempUnit};
pub use server::{Endpoint, Fingerprint, FingerprintError, Scheme, ServerConfig};
pub use simulator::{SensorKind, SensorSimulator, SimulatorConfig};
pub use transport::{HttpTransport, Reply, Transport, TransportError};

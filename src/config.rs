//! Configuration module for the Breezo station.
//!
//! This module loads the server address, credentials, station location and
//! sampling interval from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::server::{Fingerprint, ServerConfig};

/// Default client name reported to the server
const DEFAULT_CLIENT_NAME: &str = "breezo-station";

/// Default sampling interval in seconds
const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 60;

/// Minimum sampling interval to avoid flooding the ingestion API
const MIN_SAMPLE_INTERVAL_SECS: u64 = 5;

/// Maximum sampling interval
const MAX_SAMPLE_INTERVAL_SECS: u64 = 3600;

/// Configuration for the Breezo station.
///
/// All settings are read from environment variables:
/// - `BREEZO_HOST`: ingestion host, required
/// - `BREEZO_FINGERPRINT`: server certificate fingerprint; enables HTTPS
/// - `BREEZO_PORT`: port override
/// - `BREEZO_ACCESS_TOKEN`, `BREEZO_CLIENT_ID`: credentials, required
/// - `BREEZO_CLIENT_NAME`: display name (default: breezo-station)
/// - `BREEZO_LATITUDE`, `BREEZO_LONGITUDE`, `BREEZO_ALTITUDE`: location (default: 0)
/// - `BREEZO_SAMPLE_INTERVAL_SECS`: seconds between requests (default: 60)
#[derive(Clone)]
pub struct Config {
    /// Ingestion server host name or address
    pub host: String,

    /// Pinned certificate digest; HTTPS is used when set
    pub fingerprint: Option<Fingerprint>,

    /// Port override; the scheme default applies when unset
    pub port: Option<u16>,

    /// Bearer credential sent in every request body
    pub access_token: String,

    /// Identifier of this station on the server
    pub client_id: String,

    /// Human readable station name
    pub client_name: String,

    /// Station location as (latitude, longitude, altitude)
    pub location: (f64, f64, f64),

    /// Time between two requests
    pub sample_interval: Duration,
}

/// Error type for configuration loading failures
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub env_var: Option<String>,
}

impl ConfigError {
    fn for_var(env_var: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            env_var: Some(env_var.to_string()),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("fingerprint", &self.fingerprint)
            .field("port", &self.port)
            .field("access_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_name", &self.client_name)
            .field("location", &self.location)
            .field("sample_interval", &self.sample_interval)
            .finish()
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.env_var {
            Some(var) => write!(f, "Configuration error for {}: {}", var, self.message),
            None => write!(f, "Configuration error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `BREEZO_HOST`, `BREEZO_ACCESS_TOKEN` or `BREEZO_CLIENT_ID` is missing
    /// - `BREEZO_FINGERPRINT` is not a valid SHA-1 or SHA-256 hex digest
    /// - `BREEZO_PORT` is not a port number
    /// - a location variable is not a number
    /// - `BREEZO_SAMPLE_INTERVAL_SECS` is not a number or outside limits
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use breezo_client::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Host: {}", config.host);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = Self::required("BREEZO_HOST")?;
        let host = host.trim_end_matches('/').to_string();

        let fingerprint = match Self::optional("BREEZO_FINGERPRINT") {
            Some(value) => Some(
                value
                    .parse::<Fingerprint>()
                    .map_err(|e| ConfigError::for_var("BREEZO_FINGERPRINT", e.to_string()))?,
            ),
            None => None,
        };

        let port = Self::parse_port()?;

        let access_token = Self::required("BREEZO_ACCESS_TOKEN")?;
        let client_id = Self::required("BREEZO_CLIENT_ID")?;
        let client_name = Self::optional("BREEZO_CLIENT_NAME")
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());

        let location = (
            Self::parse_or("BREEZO_LATITUDE", 0.0)?,
            Self::parse_or("BREEZO_LONGITUDE", 0.0)?,
            Self::parse_or("BREEZO_ALTITUDE", 0.0)?,
        );

        let sample_interval = Duration::from_secs(Self::parse_sample_interval()?);

        Ok(Self {
            host,
            fingerprint,
            port,
            access_token,
            client_id,
            client_name,
            location,
            sample_interval,
        })
    }

    /// Server configuration derived from the host, fingerprint and port.
    pub fn server(&self) -> ServerConfig {
        let mut server = ServerConfig::new(self.host.clone());
        if let Some(fingerprint) = &self.fingerprint {
            server = server.with_fingerprint(fingerprint.clone());
        }
        if let Some(port) = self.port {
            server = server.with_port(port);
        }
        server
    }

    /// Read a variable, treating empty values as unset.
    fn optional(env_var: &str) -> Option<String> {
        env::var(env_var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(env_var: &str) -> Result<String, ConfigError> {
        Self::optional(env_var).ok_or_else(|| ConfigError::for_var(env_var, "must be set"))
    }

    fn parse_or<T: FromStr>(env_var: &str, default: T) -> Result<T, ConfigError> {
        match Self::optional(env_var) {
            Some(value) => value.parse().map_err(|_| {
                ConfigError::for_var(env_var, format!("'{}' is not a valid number", value))
            }),
            None => Ok(default),
        }
    }

    fn parse_port() -> Result<Option<u16>, ConfigError> {
        let env_var = "BREEZO_PORT";

        match Self::optional(env_var) {
            Some(value) => {
                let port: u16 = value.parse().map_err(|_| {
                    ConfigError::for_var(env_var, format!("'{}' is not a valid port", value))
                })?;

                if port == 0 {
                    return Err(ConfigError::for_var(env_var, "port must be greater than 0"));
                }

                Ok(Some(port))
            }
            None => Ok(None),
        }
    }

    /// Parse sample interval from environment variable with validation.
    fn parse_sample_interval() -> Result<u64, ConfigError> {
        let env_var = "BREEZO_SAMPLE_INTERVAL_SECS";
        let interval = Self::parse_or(env_var, DEFAULT_SAMPLE_INTERVAL_SECS)?;

        if interval < MIN_SAMPLE_INTERVAL_SECS {
            return Err(ConfigError::for_var(
                env_var,
                format!(
                    "sample interval {} is below minimum ({}s)",
                    interval, MIN_SAMPLE_INTERVAL_SECS
                ),
            ));
        }

        if interval > MAX_SAMPLE_INTERVAL_SECS {
            return Err(ConfigError::for_var(
                env_var,
                format!(
                    "sample interval {} exceeds maximum ({}s)",
                    interval, MAX_SAMPLE_INTERVAL_SECS
                ),
            ));
        }

        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Scheme;
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    // Tests in this module share process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "BREEZO_HOST",
        "BREEZO_FINGERPRINT",
        "BREEZO_PORT",
        "BREEZO_ACCESS_TOKEN",
        "BREEZO_CLIENT_ID",
        "BREEZO_CLIENT_NAME",
        "BREEZO_LATITUDE",
        "BREEZO_LONGITUDE",
        "BREEZO_ALTITUDE",
        "BREEZO_SAMPLE_INTERVAL_SECS",
    ];

    // Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                original,
            }
        }

        fn remove(key: &str) -> Self {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(val) => env::set_var(&self.key, val),
                None => env::remove_var(&self.key),
            }
        }
    }

    // Fields drop in order: variables are restored before the lock is released.
    struct TestEnv {
        _guards: Vec<EnvGuard>,
        _lock: MutexGuard<'static, ()>,
    }

    /// Lock the environment, clear every BREEZO_ variable and set the required ones.
    fn minimal_env() -> TestEnv {
        let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut guards: Vec<EnvGuard> = ALL_VARS.iter().map(|v| EnvGuard::remove(v)).collect();
        guards.push(EnvGuard::set("BREEZO_HOST", "ingest.example.org"));
        guards.push(EnvGuard::set("BREEZO_ACCESS_TOKEN", "token"));
        guards.push(EnvGuard::set("BREEZO_CLIENT_ID", "station-1"));
        TestEnv {
            _guards: guards,
            _lock: lock,
        }
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _env = minimal_env();

        let config = Config::from_env().expect("Should load with defaults");
        assert_eq!(config.host, "ingest.example.org");
        assert_eq!(config.access_token, "token");
        assert_eq!(config.client_id, "station-1");
        assert_eq!(config.client_name, "breezo-station");
        assert_eq!(config.location, (0.0, 0.0, 0.0));
        assert_eq!(config.sample_interval, Duration::from_secs(60));
        assert!(config.fingerprint.is_none());
        assert!(config.port.is_none());

        let server = config.server();
        assert_eq!(server.scheme(), Scheme::Http);
        assert_eq!(server.endpoint().url, "http://ingest.example.org");
    }

    #[test]
    fn test_config_from_env_custom_values() {
        let _env = minimal_env();
        let _g1 = EnvGuard::set("BREEZO_HOST", "ingest.example.org/");
        let _g2 = EnvGuard::set(
            "BREEZO_FINGERPRINT",
            "01 23 45 67 89 ab cd ef 01 23 45 67 89 ab cd ef 01 23 45 67",
        );
        let _g3 = EnvGuard::set("BREEZO_PORT", "8443");
        let _g4 = EnvGuard::set("BREEZO_CLIENT_NAME", "Rooftop");
        let _g5 = EnvGuard::set("BREEZO_LATITUDE", "52.37");
        let _g6 = EnvGuard::set("BREEZO_LONGITUDE", "4.89");
        let _g7 = EnvGuard::set("BREEZO_ALTITUDE", "-2");
        let _g8 = EnvGuard::set("BREEZO_SAMPLE_INTERVAL_SECS", "30");

        let config = Config::from_env().expect("Should load custom values");
        assert_eq!(config.host, "ingest.example.org"); // Trailing slash removed
        assert_eq!(config.client_name, "Rooftop");
        assert_eq!(config.location, (52.37, 4.89, -2.0));
        assert_eq!(config.sample_interval, Duration::from_secs(30));

        let server = config.server();
        assert_eq!(server.scheme(), Scheme::Https);
        assert_eq!(server.endpoint().url, "https://ingest.example.org:8443");
    }

    #[test]
    fn test_missing_host() {
        let _env = minimal_env();
        let _guard = EnvGuard::remove("BREEZO_HOST");

        let err = Config::from_env().unwrap_err();
        assert_eq!(err.env_var.as_deref(), Some("BREEZO_HOST"));
        assert!(err.message.contains("must be set"));
    }

    #[test]
    fn test_blank_token_is_missing() {
        let _env = minimal_env();
        let _guard = EnvGuard::set("BREEZO_ACCESS_TOKEN", "   ");

        let err = Config::from_env().unwrap_err();
        assert_eq!(err.env_var.as_deref(), Some("BREEZO_ACCESS_TOKEN"));
    }

    #[test]
    fn test_invalid_fingerprint() {
        let _env = minimal_env();
        let _guard = EnvGuard::set("BREEZO_FINGERPRINT", "abcd");

        let err = Config::from_env().unwrap_err();
        assert_eq!(err.env_var.as_deref(), Some("BREEZO_FINGERPRINT"));
        assert!(err.message.contains("expected 20"));
    }

    #[test]
    fn test_invalid_port() {
        let _env = minimal_env();
        let _guard = EnvGuard::set("BREEZO_PORT", "70000");
        let err = Config::from_env().unwrap_err();
        assert!(err.message.contains("not a valid port"));

        let _guard = EnvGuard::set("BREEZO_PORT", "0");
        let err = Config::from_env().unwrap_err();
        assert!(err.message.contains("greater than 0"));
    }

    #[test]
    fn test_invalid_latitude() {
        let _env = minimal_env();
        let _guard = EnvGuard::set("BREEZO_LATITUDE", "north");

        let err = Config::from_env().unwrap_err();
        assert!(err.message.contains("not a valid number"));
    }

    #[test]
    fn test_sample_interval_limits() {
        let _env = minimal_env();

        let _guard = EnvGuard::set("BREEZO_SAMPLE_INTERVAL_SECS", "1");
        let err = Config::from_env().unwrap_err();
        assert!(err.message.contains("below minimum"));

        let _guard = EnvGuard::set("BREEZO_SAMPLE_INTERVAL_SECS", "99999");
        let err = Config::from_env().unwrap_err();
        assert!(err.message.contains("exceeds maximum"));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError {
            message: "test error".to_string(),
            env_var: Some("TEST_VAR".to_string()),
        };
        assert_eq!(
            format!("{}", error),
            "Configuration error for TEST_VAR: test error"
        );

        let error_no_var = ConfigError {
            message: "general error".to_string(),
            env_var: None,
        };
        assert_eq!(
            format!("{}", error_no_var),
            "Configuration error: general error"
        );
    }

    #[test]
    fn test_config_debug_redacts_access_token() {
        let _env = minimal_env();

        let config = Config::from_env().unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("\"token\""));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("station-1"));
    }
}

//! Server configuration module.
//!
//! A [`ServerConfig`] names the ingestion host and selects the transport
//! security mode: a certificate [`Fingerprint`] selects `https` with the
//! peer pinned to that certificate, no fingerprint selects plain `http`.

use std::fmt;
use std::str::FromStr;

use ring::digest;
use thiserror::Error;

/// URL scheme used to reach the ingestion host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from parsing a certificate fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    #[error("fingerprint is empty")]
    Empty,

    #[error("invalid hex digit '{0}' in fingerprint")]
    InvalidDigit(char),

    #[error("fingerprint has {0} bytes, expected 20 (SHA-1) or 32 (SHA-256)")]
    InvalidLength(usize),
}

/// Digest of a server certificate used for pinned TLS.
///
/// Parsed from hex, optionally separated by `:` or spaces, e.g.
/// `"AB:CD:..."` or `"ab cd ..."`. The digest algorithm is chosen by
/// length: 20 bytes is SHA-1, 32 bytes is SHA-256.
#[derive(Clone, PartialEq, Eq)]
pub enum Fingerprint {
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Fingerprint::Sha1(bytes) => bytes,
            Fingerprint::Sha256(bytes) => bytes,
        }
    }

    /// Check whether a DER-encoded certificate hashes to this fingerprint.
    pub fn matches(&self, der: &[u8]) -> bool {
        let algorithm = match self {
            Fingerprint::Sha1(_) => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            Fingerprint::Sha256(_) => &digest::SHA256,
        };
        digest::digest(algorithm, der).as_ref() == self.as_bytes()
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<char> = s
            .chars()
            .filter(|c| *c != ':' && !c.is_whitespace())
            .collect();

        if digits.is_empty() {
            return Err(FingerprintError::Empty);
        }

        if let Some(bad) = digits.iter().find(|c| !c.is_ascii_hexdigit()) {
            return Err(FingerprintError::InvalidDigit(*bad));
        }

        if digits.len() % 2 != 0 {
            return Err(FingerprintError::InvalidLength(digits.len() / 2));
        }

        let bytes: Vec<u8> = digits
            .chunks(2)
            .map(|pair| {
                // both digits validated above
                let hi = pair[0].to_digit(16).unwrap_or(0) as u8;
                let lo = pair[1].to_digit(16).unwrap_or(0) as u8;
                (hi << 4) | lo
            })
            .collect();

        if let Ok(sha1) = <[u8; 20]>::try_from(bytes.as_slice()) {
            Ok(Fingerprint::Sha1(sha1))
        } else if let Ok(sha256) = <[u8; 32]>::try_from(bytes.as_slice()) {
            Ok(Fingerprint::Sha256(sha256))
        } else {
            Err(FingerprintError::InvalidLength(bytes.len()))
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Fingerprint::Sha1(_) => "Sha1",
            Fingerprint::Sha256(_) => "Sha256",
        };
        write!(f, "{}({})", name, self)
    }
}

/// Where the transport should send a request, and how to trust the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Full target URL, `scheme://host[:port]`
    pub url: String,

    /// Certificate the peer must present, if the scheme is `https`
    pub pin: Option<Fingerprint>,
}

impl Endpoint {
    pub fn scheme(&self) -> Scheme {
        if self.pin.is_some() {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }
}

/// Immutable description of the ingestion server.
///
/// # Example
///
/// ```
/// use breezo_client::server::{Scheme, ServerConfig};
///
/// let plain = ServerConfig::new("ingest.example.org");
/// assert_eq!(plain.scheme(), Scheme::Http);
/// assert_eq!(plain.endpoint().url, "http://ingest.example.org");
///
/// let pinned = ServerConfig::new("ingest.example.org")
///     .with_fingerprint("0123456789abcdef0123456789abcdef01234567".parse().unwrap());
/// assert_eq!(pinned.endpoint().url, "https://ingest.example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    host: String,
    fingerprint: Option<Fingerprint>,
    port: Option<u16>,
}

impl ServerConfig {
    /// Plaintext configuration for `host` on the scheme's default port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            fingerprint: None,
            port: None,
        }
    }

    /// Pin the server certificate, switching the scheme to `https`.
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// Override the port. The scheme's default port is left out of the URL.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme().default_port())
    }

    pub fn scheme(&self) -> Scheme {
        if self.fingerprint.is_some() {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    /// Build the target handed to the transport.
    pub fn endpoint(&self) -> Endpoint {
        let scheme = self.scheme();
        let url = match self.port {
            Some(port) if port != scheme.default_port() => {
                format!("{}://{}:{}", scheme, self.host, port)
            }
            _ => format!("{}://{}", scheme, self.host),
        };

        Endpoint {
            url,
            pin: self.fingerprint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA1_HEX: &str = "AB:CD:EF:01:23:45:67:89:AB:CD:EF:01:23:45:67:89:AB:CD:EF:01";

    #[test]
    fn test_parse_sha1_with_colons() {
        let fp: Fingerprint = SHA1_HEX.parse().unwrap();
        assert!(matches!(fp, Fingerprint::Sha1(_)));
        assert_eq!(fp.as_bytes()[0], 0xAB);
        assert_eq!(fp.to_string(), SHA1_HEX);
    }

    #[test]
    fn test_parse_sha256_with_spaces() {
        let hex = vec!["0f"; 32].join(" ");
        let fp: Fingerprint = hex.parse().unwrap();
        assert!(matches!(fp, Fingerprint::Sha256(_)));
        assert!(fp.as_bytes().iter().all(|b| *b == 0x0f));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Fingerprint>(), Err(FingerprintError::Empty));
        assert_eq!(" : ".parse::<Fingerprint>(), Err(FingerprintError::Empty));
        assert_eq!(
            "zz".parse::<Fingerprint>(),
            Err(FingerprintError::InvalidDigit('z'))
        );
        assert_eq!(
            "abcd".parse::<Fingerprint>(),
            Err(FingerprintError::InvalidLength(2))
        );
        assert_eq!(
            "abc".parse::<Fingerprint>(),
            Err(FingerprintError::InvalidLength(1))
        );
    }

    #[test]
    fn test_matches_certificate_digest() {
        let der = b"not really a certificate";

        let sha256 = digest::digest(&digest::SHA256, der);
        let fp = Fingerprint::Sha256(sha256.as_ref().try_into().unwrap());
        assert!(fp.matches(der));
        assert!(!fp.matches(b"another certificate"));

        let sha1 = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, der);
        let fp = Fingerprint::Sha1(sha1.as_ref().try_into().unwrap());
        assert!(fp.matches(der));
    }

    #[test]
    fn test_scheme_follows_fingerprint() {
        let plain = ServerConfig::new("example.org");
        assert_eq!(plain.scheme(), Scheme::Http);
        assert_eq!(plain.port(), 80);
        assert_eq!(plain.endpoint().url, "http://example.org");
        assert!(plain.endpoint().pin.is_none());

        let pinned = plain.with_fingerprint(SHA1_HEX.parse().unwrap());
        assert_eq!(pinned.scheme(), Scheme::Https);
        assert_eq!(pinned.port(), 443);
        assert_eq!(pinned.endpoint().url, "https://example.org");
        assert_eq!(pinned.endpoint().scheme(), Scheme::Https);
    }

    #[test]
    fn test_port_in_url() {
        let config = ServerConfig::new("example.org").with_port(8080);
        assert_eq!(config.endpoint().url, "http://example.org:8080");

        let config = ServerConfig::new("example.org").with_port(80);
        assert_eq!(config.endpoint().url, "http://example.org");

        let config = ServerConfig::new("example.org")
            .with_fingerprint(SHA1_HEX.parse().unwrap())
            .with_port(443);
        assert_eq!(config.endpoint().url, "https://example.org");
    }

    #[test]
    fn test_fingerprint_debug_shows_algorithm() {
        let fp: Fingerprint = SHA1_HEX.parse().unwrap();
        assert!(format!("{:?}", fp).starts_with("Sha1(AB:CD"));
    }
}

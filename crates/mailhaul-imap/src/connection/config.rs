//! Connection configuration types.

use std::path::PathBuf;

/// Default read chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1500;

/// Default bound on attempts for transiently failing reads and writes.
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Platform directory scanned for trusted certificates by default.
pub const DEFAULT_CERTIFICATE_DIR: &str = "/etc/ssl/certs";

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plaintext TCP (port 143). **Not recommended for production.**
    None,
    /// TLS from the start (port 993). **Recommended.**
    #[default]
    Tls,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 143,
            Self::Tls => 993,
        }
    }
}

/// Trust anchors used to validate the server certificate chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStore {
    /// Optional PEM file holding one or more trusted certificates.
    pub certificate_file: Option<PathBuf>,
    /// Directory scanned for PEM certificates.
    pub certificate_dir: PathBuf,
}

impl Default for TrustStore {
    fn default() -> Self {
        Self {
            certificate_file: None,
            certificate_dir: PathBuf::from(DEFAULT_CERTIFICATE_DIR),
        }
    }
}

/// Client connection configuration.
///
/// Retry bound and chunk size are runtime configuration rather than
/// compile-time constants so tests can exercise small bounds
/// deterministically.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Trust anchors for TLS certificate validation.
    pub trust: TrustStore,
    /// Read chunk size in bytes.
    pub chunk_size: usize,
    /// Bound on attempts for transiently failing reads and writes.
    pub max_retries: u32,
}

impl Config {
    /// Creates a configuration with implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Security::Tls.default_port(),
            security: Security::Tls,
            trust: TrustStore::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    trust: TrustStore,
    chunk_size: usize,
    max_retries: u32,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::default(),
            trust: TrustStore::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets a PEM file of trusted certificates.
    #[must_use]
    pub fn certificate_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust.certificate_file = Some(path.into());
        self
    }

    /// Sets the directory scanned for trusted certificates.
    #[must_use]
    pub fn certificate_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust.certificate_dir = path.into();
        self
    }

    /// Sets the read chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the bound on transient I/O attempts.
    #[must_use]
    pub const fn max_retries(mut self, bound: u32) -> Self {
        self.max_retries = bound;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            host: self.host,
            security: self.security,
            trust: self.trust,
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(Security::None.default_port(), 143);
        assert_eq!(Security::Tls.default_port(), 993);
    }

    #[test]
    fn test_config_new() {
        let config = Config::new("mail.example.com");
        assert_eq!(config.host, "mail.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.security, Security::Tls);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder("mail.example.com")
            .port(1143)
            .security(Security::None)
            .chunk_size(64)
            .max_retries(3)
            .build();

        assert_eq!(config.port, 1143);
        assert_eq!(config.security, Security::None);
        assert_eq!(config.chunk_size, 64);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_config_builder_default_port_follows_security() {
        let config = Config::builder("mail.example.com")
            .security(Security::None)
            .build();
        assert_eq!(config.port, 143);
    }

    #[test]
    fn test_trust_store_defaults() {
        let trust = TrustStore::default();
        assert!(trust.certificate_file.is_none());
        assert_eq!(trust.certificate_dir, PathBuf::from(DEFAULT_CERTIFICATE_DIR));
    }

    #[test]
    fn test_trust_store_paths() {
        let config = Config::builder("mail.example.com")
            .certificate_file("/tmp/anchor.pem")
            .certificate_dir("/tmp/anchors")
            .build();
        assert_eq!(
            config.trust.certificate_file,
            Some(PathBuf::from("/tmp/anchor.pem"))
        );
        assert_eq!(config.trust.certificate_dir, PathBuf::from("/tmp/anchors"));
    }
}

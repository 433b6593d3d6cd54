//! Stream types for client connections.

#![allow(clippy::missing_errors_doc)]

use std::fs::File;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::config::TrustStore;
use crate::{Error, Result};

/// A stream that can be either plaintext or TLS.
pub enum ImapStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl ImapStream {
    /// Creates a new plaintext stream.
    pub const fn plain(stream: TcpStream) -> Self {
        Self::Plain(stream)
    }

    /// Creates a new TLS stream.
    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        Self::Tls(Box::new(stream))
    }

    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Builds a root store from the configured trust anchors.
///
/// PEM certificates come from the optional file and from the trust
/// directory; when neither yields a root, the bundled Mozilla roots stand in
/// for the platform store.
pub fn build_root_store(trust: &TrustStore) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();

    if let Some(path) = &trust.certificate_file {
        add_pem_file(&mut roots, path)?;
    }
    if let Ok(entries) = std::fs::read_dir(&trust.certificate_dir) {
        for entry in entries.flatten() {
            // Unreadable or non-certificate files in a shared system
            // directory are skipped, not fatal.
            let _ = add_pem_file(&mut roots, &entry.path());
        }
    }
    if roots.is_empty() {
        roots.roots = webpki_roots::TLS_SERVER_ROOTS.to_vec();
    }

    Ok(roots)
}

fn add_pem_file(roots: &mut RootCertStore, path: &Path) -> Result<()> {
    let file = File::open(path)?;
    let mut reader = io::BufReader::new(file);
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert?)?;
    }
    Ok(())
}

/// Creates a TLS connector validating against the given trust anchors.
pub fn create_tls_connector(trust: &TrustStore) -> Result<TlsConnector> {
    let roots = build_root_store(trust)?;

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Connects to a server with TLS from the start.
///
/// The handshake validates the server certificate chain against the trust
/// store; an untrusted chain aborts connection establishment.
pub async fn connect_tls(host: &str, port: u16, trust: &TrustStore) -> Result<ImapStream> {
    let addr = format!("{host}:{port}");
    let tcp = TcpStream::connect(&addr).await?;

    let connector = create_tls_connector(trust)?;
    let server_name = ServerName::try_from(host.to_string())?;
    let tls = connector
        .connect(server_name, tcp)
        .await
        .map_err(certificate_error)?;

    Ok(ImapStream::Tls(Box::new(tls)))
}

/// Connects to a server without TLS.
pub async fn connect_plain(host: &str, port: u16) -> Result<ImapStream> {
    let addr = format!("{host}:{port}");
    let tcp = TcpStream::connect(&addr).await?;
    Ok(ImapStream::Plain(tcp))
}

/// Maps a handshake failure caused by chain validation to its own variant.
fn certificate_error(err: io::Error) -> Error {
    let invalid_cert = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .is_some_and(|tls| matches!(tls, rustls::Error::InvalidCertificate(_)));
    if invalid_cert {
        Error::UntrustedCertificate(err.to_string())
    } else {
        Error::Io(err)
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
    fn test_default_trust_store_yields_roots() {
        let roots = build_root_store(&TrustStore::default()).unwrap();
        assert!(!roots.is_empty());
    }

    #[test]
    fn test_create_tls_connector() {
        assert!(create_tls_connector(&TrustStore::default()).is_ok());
    }

    #[test]
    fn test_missing_certificate_file_is_fatal() {
        let trust = TrustStore {
            certificate_file: Some("/nonexistent/anchor.pem".into()),
            ..TrustStore::default()
        };
        assert!(matches!(build_root_store(&trust), Err(Error::Io(_))));
    }

    #[test]
    fn test_validation_failure_maps_to_untrusted_certificate() {
        let tls_err =
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let err = certificate_error(io::Error::new(io::ErrorKind::InvalidData, tls_err));
        assert!(matches!(err, Error::UntrustedCertificate(_)));
    }

    #[test]
    fn test_other_handshake_failures_stay_io() {
        let err = certificate_error(io::Error::new(io::ErrorKind::BrokenPipe, "reset"));
        assert!(matches!(err, Error::Io(_)));
    }
}

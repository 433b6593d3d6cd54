//! Error types for the mail retrieval engine.

use thiserror::Error;

/// Errors that can occur during client operations.
///
/// No failure is recovered internally except the bounded transient-I/O retry
/// inside the transport; everything else aborts the in-progress operation
/// and surfaces here. There is no partial success: a FETCH that fails
/// validation yields no message map at all.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations, including an exhausted
    /// transient-retry budget.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection (zero-byte read).
    #[error("server closed connection")]
    ConnectionClosed,

    /// TLS configuration or handshake error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// The server certificate chain failed validation against the trust
    /// store. Aborts connection establishment.
    #[error("untrusted server certificate: {0}")]
    UntrustedCertificate(String),

    /// LOGIN was rejected by the server.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// LOGOUT was rejected by the server.
    #[error("logout failed: {0}")]
    Logout(String),

    /// SELECT was rejected by the server.
    #[error("could not select mailbox: {0}")]
    Select(String),

    /// The operation requires a logged-in session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The operation requires a non-empty selected mailbox.
    #[error("selected mailbox is empty")]
    EmptyMailbox,

    /// FETCH was rejected by the server.
    #[error("could not fetch messages: {0}")]
    Fetch(String),

    /// SEARCH was rejected by the server.
    #[error("could not search messages: {0}")]
    Search(String),

    /// The server reply does not have the shape this engine's own commands
    /// produce.
    #[error("malformed server reply: {0}")]
    MalformedReply(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

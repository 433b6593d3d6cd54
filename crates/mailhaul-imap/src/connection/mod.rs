//! Connection management.
//!
//! This module provides everything between the caller and the wire:
//! - Configuration (host, port, security mode, trust anchors, I/O limits)
//! - TLS/plaintext stream abstraction
//! - Chunked transport with the reply accumulation loop
//! - The protocol session state machine

mod config;
mod framed;
mod session;
mod stream;

pub use config::{
    Config, ConfigBuilder, DEFAULT_CERTIFICATE_DIR, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES,
    Security, TrustStore,
};
pub use framed::FramedStream;
pub use session::Session;
pub use stream::{ImapStream, build_root_store, connect_plain, connect_tls, create_tls_connector};

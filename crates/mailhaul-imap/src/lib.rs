//! # mailhaul-imap
//!
//! Client engine for a tag-correlated, line-oriented mail-access protocol
//! over TCP or TLS.
//!
//! The crate covers the four hard parts of such a client and deliberately
//! nothing else:
//!
//! - **Reply framing**: detecting, chunk by chunk, when a server reply is
//!   complete — the last physical line must carry the tag of the
//!   outstanding command
//! - **Tag correlation**: a strictly increasing per-connection counter,
//!   advanced only after a validated exchange, so requests and terminal
//!   reply lines always pair up
//! - **Session state**: authentication and selected-mailbox state gating
//!   which operations are legal, with typed errors instead of surprises
//! - **Literal extraction**: pulling length-prefixed message bodies out of
//!   FETCH replies byte-exact, immune to CRLF sequences inside content
//!
//! Exactly one command is in flight per connection; I/O is sequential with
//! no background tasks and no receive timeout. Argument parsing, credential
//! storage, and writing messages to disk belong to callers.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailhaul_imap::{Config, FetchScope, Session};
//!
//! #[tokio::main]
//! async fn main() -> mailhaul_imap::Result<()> {
//!     let config = Config::builder("mail.example.com")
//!         .certificate_file("/etc/mailhaul/anchor.pem")
//!         .build();
//!
//!     let mut session = Session::connect(&config).await?;
//!     session.login("user@example.com", "password").await?;
//!
//!     let count = session.select("inbox").await?;
//!     println!("{count} messages");
//!
//!     for (uid, message) in session.fetch_new(FetchScope::Full).await? {
//!         println!("new message {uid}: {} bytes", message.len());
//!     }
//!
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command builders and the tag sequence
//! - [`connection`]: configuration, plain/TLS streams, transport, session
//! - [`parser`]: reply framing predicate and reply parsers
//! - [`types`]: sequence sets, mailbox state, fetched-message map

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchScope, Tag, TagSequence};
pub use connection::{
    Config, ConfigBuilder, FramedStream, ImapStream, Security, Session, TrustStore,
};
pub use error::{Error, Result};
pub use types::{MessageMap, SelectedMailbox, SequenceSet};

//! Core protocol types.

mod mailbox;
mod sequence;

pub use mailbox::SelectedMailbox;
pub use sequence::SequenceSet;

/// Fetched messages keyed by the server-assigned UID string.
///
/// Values are the exact bytes declared by the literal length and may contain
/// arbitrary content including CRLF sequences. Duplicate identifiers within
/// one reply overwrite; last write wins.
pub type MessageMap = std::collections::HashMap<String, Vec<u8>>;

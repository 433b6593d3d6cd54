//! Reply parsing.
//!
//! The engine issues a fixed set of commands and tolerates only the reply
//! shapes those commands produce; the parsers here are correspondingly
//! small. Framing (completion detection) lives alongside them because the
//! literal extractor reuses the same last-line computation to find the
//! terminal status line.

pub mod fetch;
pub mod frame;
pub mod search;
pub mod select;

pub use fetch::parse_messages;
pub use frame::{has_ok_status, is_complete, last_line_start};
pub use search::parse_sequence_set;
pub use select::parse_exists;

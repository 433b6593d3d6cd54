//! SELECT reply parsing.

use crate::error::{Error, Result};

/// Extracts the mailbox message count from a SELECT reply.
///
/// The reply carries an untagged `* <n> EXISTS` line; the keyword is matched
/// case-insensitively and `<n>` is the space-delimited token immediately
/// before it.
pub fn parse_exists(reply: &[u8]) -> Result<u32> {
    let text = String::from_utf8_lossy(reply);
    let end = text
        .to_ascii_lowercase()
        .find(" exists")
        .ok_or_else(|| Error::MalformedReply("missing EXISTS line in select reply".to_string()))?;
    let head = &text[..end];
    let start = head.rfind(' ').ok_or_else(|| {
        Error::MalformedReply("missing message count before EXISTS".to_string())
    })?;
    head[start + 1..].parse().map_err(|_| {
        Error::MalformedReply(format!("invalid message count {:?}", &head[start + 1..]))
    })
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
    fn test_parses_count() {
        let reply = b"* 42 EXISTS\r\n* 0 RECENT\r\n1 OK [READ-WRITE] selected\r\n";
        assert_eq!(parse_exists(reply).unwrap(), 42);
    }

    #[test]
    fn test_zero_count() {
        let reply = b"* 0 EXISTS\r\n1 OK done\r\n";
        assert_eq!(parse_exists(reply).unwrap(), 0);
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let reply = b"* 7 exists\r\n1 OK done\r\n";
        assert_eq!(parse_exists(reply).unwrap(), 7);
    }

    #[test]
    fn test_missing_exists_line_is_malformed() {
        let reply = b"1 OK nothing to see\r\n";
        assert!(matches!(
            parse_exists(reply),
            Err(Error::MalformedReply(_))
        ));
    }

    #[test]
    fn test_non_numeric_count_is_malformed() {
        let reply = b"* many EXISTS\r\n1 OK done\r\n";
        assert!(matches!(
            parse_exists(reply),
            Err(Error::MalformedReply(_))
        ));
    }
}

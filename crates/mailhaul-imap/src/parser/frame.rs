//! Reply completion framing.
//!
//! Servers emit zero or more untagged lines followed by exactly one tagged
//! status line. The predicate here detects "more data needed" without
//! parsing every line: it only checks where the last physical line starts
//! and whether it carries the expected tag. Malformed input whose tag string
//! coincidentally prefixes an untagged line can fool it — acceptable for a
//! client talking to a trusted server.

use crate::command::Tag;

/// Returns the index where the last physical line of `buf` starts.
///
/// Searches for the last CR or LF strictly before the final two bytes
/// (those are expected to be the trailing CRLF of the last line itself) and
/// falls back to the buffer start when no earlier terminator exists.
#[must_use]
pub fn last_line_start(buf: &[u8]) -> usize {
    let Some(search_end) = buf.len().checked_sub(2) else {
        return 0;
    };
    buf[..search_end]
        .iter()
        .rposition(|&b| b == b'\r' || b == b'\n')
        .map_or(0, |i| i + 1)
}

/// Returns the last physical line of `buf`, including its trailing CRLF.
#[must_use]
pub fn last_line(buf: &[u8]) -> &[u8] {
    &buf[last_line_start(buf)..]
}

/// Decides whether an accumulating reply buffer is complete for `tag`.
///
/// A reply is complete once its last physical line begins with the decimal
/// tag string. Short replies may consist of the tagged status line alone,
/// so the buffer start is checked as well.
#[must_use]
pub fn is_complete(buf: &[u8], tag: Tag) -> bool {
    if buf.is_empty() {
        return false;
    }
    let tag = tag.to_string();
    buf.starts_with(tag.as_bytes()) || last_line(buf).starts_with(tag.as_bytes())
}

/// Checks that a completed reply reports success for `tag`.
#[must_use]
pub fn has_ok_status(buf: &[u8], tag: Tag) -> bool {
    let marker = format!("{tag} OK");
    let marker = marker.as_bytes();
    buf.windows(marker.len()).any(|window| window == marker)
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
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_empty_buffer_is_never_complete() {
        assert!(!is_complete(b"", Tag::new(0)));
        assert!(!is_complete(b"", Tag::new(5)));
    }

    #[test]
    fn test_single_tagged_line_is_complete() {
        assert!(is_complete(b"5 OK done\r\n", Tag::new(5)));
    }

    #[test]
    fn test_wrong_tag_is_not_complete() {
        assert!(!is_complete(b"5 OK done\r\n", Tag::new(6)));
    }

    #[test]
    fn test_untagged_line_is_not_complete() {
        assert!(!is_complete(b"* 3 EXISTS\r\n", Tag::new(3)));
    }

    #[test]
    fn test_multi_line_reply_completes_on_tagged_last_line() {
        let buf = b"* SEARCH 7 7 7\r\n7 OK search done\r\n";
        assert!(is_complete(buf, Tag::new(7)));
    }

    #[test]
    fn test_tag_string_inside_earlier_line_is_ignored() {
        // "12" appears mid-line above; only the last line start counts.
        let buf = b"* 12 EXISTS\r\n* OK still going\r\n";
        assert!(!is_complete(buf, Tag::new(12)));
    }

    #[test]
    fn test_last_line_start_falls_back_to_zero() {
        assert_eq!(last_line_start(b""), 0);
        assert_eq!(last_line_start(b"\r\n"), 0);
        assert_eq!(last_line_start(b"5 OK done\r\n"), 0);
    }

    #[test]
    fn test_last_line_start_excludes_final_crlf() {
        let buf = b"* 1 EXISTS\r\n1 OK done\r\n";
        assert_eq!(last_line_start(buf), 12);
        assert_eq!(last_line(buf), b"1 OK done\r\n");
    }

    #[test]
    fn test_has_ok_status() {
        assert!(has_ok_status(b"3 OK fetch done\r\n", Tag::new(3)));
        assert!(has_ok_status(b"* 1 EXISTS\r\n3 OK done\r\n", Tag::new(3)));
        assert!(!has_ok_status(b"3 NO try harder\r\n", Tag::new(3)));
        assert!(!has_ok_status(b"30 OK done\r\n", Tag::new(3)));
    }

    proptest! {
        #[test]
        fn prop_untagged_lines_alone_never_complete(
            lines in proptest::collection::vec("\\* [ -~]{0,40}", 1..8),
            tag in 0u32..10_000,
        ) {
            let mut buf = Vec::new();
            for line in &lines {
                buf.extend_from_slice(line.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            prop_assert!(!is_complete(&buf, Tag::new(tag)));
        }

        #[test]
        fn prop_tagged_last_line_completes(
            lines in proptest::collection::vec("\\* [ -~]{0,40}", 0..8),
            tag in 0u32..10_000,
        ) {
            let mut buf = Vec::new();
            for line in &lines {
                buf.extend_from_slice(line.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            buf.extend_from_slice(format!("{tag} OK done\r\n").as_bytes());
            prop_assert!(is_complete(&buf, Tag::new(tag)));
        }
    }
}

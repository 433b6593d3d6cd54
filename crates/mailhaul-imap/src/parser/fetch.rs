//! FETCH reply parsing: literal payload extraction.
//!
//! Message content arrives as length-prefixed literals (`{<n>}` at the end
//! of a data line, followed by exactly `<n>` raw bytes). Line-splitting
//! cannot extract it: a message body is free to contain CRLF sequences, and
//! only the declared byte count is authoritative.

use crate::error::{Error, Result};
use crate::parser::frame::last_line_start;
use crate::types::MessageMap;

/// Parses a validated FETCH reply into UID → exact message bytes.
///
/// Data items have the shape `* <n> FETCH (UID <uid> ... {<len>}` followed
/// by `<len>` raw bytes and a closing parenthesis. The terminal status line
/// marks the boundary and is never read as a data item. Duplicate
/// identifiers overwrite; last write wins.
pub fn parse_messages(reply: &[u8]) -> Result<MessageMap> {
    let mut messages = MessageMap::new();
    let boundary = last_line_start(reply);
    let mut cursor = 0;

    while cursor < boundary {
        // Leftovers of the previous item's closing parenthesis line; servers
        // differ on whether `)` shares the literal's last line or gets its
        // own.
        if matches!(reply[cursor], b')' | b'\r' | b'\n') {
            cursor += 1;
            continue;
        }

        let rest = &reply[cursor..];
        let line_end = rest
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .ok_or_else(|| {
                Error::MalformedReply("unterminated fetch data line".to_string())
            })?;
        let line = &rest[..line_end];

        let uid = data_item_uid(line)?;
        let (brace_close, length) = literal_length(line)?;

        // Content starts after the closing brace and the line's own CRLF.
        let content_start = cursor + brace_close + 3;
        let content_end = content_start + length;
        if content_end > reply.len() {
            return Err(Error::MalformedReply(format!(
                "literal of {length} bytes overruns the reply"
            )));
        }
        messages.insert(uid, reply[content_start..content_end].to_vec());

        // Past the content and its trailing CRLF; any closing-parenthesis
        // bytes are skipped at the top of the loop.
        cursor = content_end + 2;
    }

    Ok(messages)
}

/// Identifier of a data item: the token following the UID keyword.
fn data_item_uid(line: &[u8]) -> Result<String> {
    let text = String::from_utf8_lossy(line);
    let mut tokens = text.split(' ');
    tokens
        .find(|token| token.trim_start_matches('(').eq_ignore_ascii_case("uid"))
        .ok_or_else(|| Error::MalformedReply(format!("missing UID item in {text:?}")))?;
    let uid = tokens
        .next()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::MalformedReply(format!("missing UID value in {text:?}")))?;
    Ok(uid.to_string())
}

/// Byte length of the literal announced at the end of a data line, returned
/// with the position of its closing brace within the line.
fn literal_length(line: &[u8]) -> Result<(usize, usize)> {
    let open = line
        .iter()
        .rposition(|&b| b == b'{')
        .ok_or_else(|| malformed_line(line, "missing literal open brace"))?;
    let close = line
        .iter()
        .skip(open)
        .position(|&b| b == b'}')
        .map(|i| open + i)
        .ok_or_else(|| malformed_line(line, "missing literal close brace"))?;
    let length = std::str::from_utf8(&line[open + 1..close])
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| malformed_line(line, "invalid literal length"))?;
    Ok((close, length))
}

fn malformed_line(line: &[u8], what: &str) -> Error {
    Error::MalformedReply(format!("{what} in {:?}", String::from_utf8_lossy(line)))
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
    fn test_single_message_round_trip() {
        let reply = b"* 1 FETCH (UID 10 BODY[] {5}\r\nhello\r\n)\r\n5 OK done\r\n";
        let messages = parse_messages(reply).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages["10"], b"hello");
    }

    #[test]
    fn test_paren_on_same_line_as_literal() {
        let reply = b"* 1 FETCH (UID 10 RFC822 {5}\r\nhello)\r\n5 OK done\r\n";
        let messages = parse_messages(reply).unwrap();
        assert_eq!(messages["10"], b"hello");
    }

    #[test]
    fn test_content_with_embedded_crlf() {
        let reply = b"* 1 FETCH (UID 10 BODY[] {5}\r\nh\r\nl\r\n)\r\n5 OK done\r\n";
        let messages = parse_messages(reply).unwrap();
        assert_eq!(messages["10"], b"h\r\nl");
    }

    #[test]
    fn test_multiple_messages() {
        let reply = b"* 1 FETCH (UID 10 RFC822 {5}\r\nhello)\r\n\
                      * 2 FETCH (UID 11 RFC822 {7}\r\nbye\r\nok)\r\n\
                      3 OK fetch done\r\n";
        let messages = parse_messages(reply).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages["10"], b"hello");
        assert_eq!(messages["11"], b"bye\r\nok");
    }

    #[test]
    fn test_duplicate_uid_last_write_wins() {
        let reply = b"* 1 FETCH (UID 10 RFC822 {3}\r\nold)\r\n\
                      * 2 FETCH (UID 10 RFC822 {3}\r\nnew)\r\n\
                      3 OK fetch done\r\n";
        let messages = parse_messages(reply).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages["10"], b"new");
    }

    #[test]
    fn test_missing_braces_is_malformed() {
        let reply = b"* 1 FETCH (UID 10 RFC822)\r\n3 OK done\r\n";
        assert!(matches!(
            parse_messages(reply),
            Err(Error::MalformedReply(_))
        ));
    }

    #[test]
    fn test_missing_uid_is_malformed() {
        let reply = b"* 1 FETCH (RFC822 {5}\r\nhello)\r\n3 OK done\r\n";
        assert!(matches!(
            parse_messages(reply),
            Err(Error::MalformedReply(_))
        ));
    }

    #[test]
    fn test_literal_overrunning_reply_is_malformed() {
        let reply = b"* 1 FETCH (UID 10 RFC822 {9999}\r\nhello)\r\n3 OK done\r\n";
        assert!(matches!(
            parse_messages(reply),
            Err(Error::MalformedReply(_))
        ));
    }

    #[test]
    fn test_status_line_only_yields_empty_map() {
        let reply = b"3 OK nothing fetched\r\n";
        assert!(parse_messages(reply).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_literal_round_trip(
            content in proptest::collection::vec(any::<u8>(), 0..200),
            uid in 1u32..100_000,
        ) {
            let mut reply =
                format!("* 1 FETCH (UID {uid} RFC822 {{{}}}\r\n", content.len()).into_bytes();
            reply.extend_from_slice(&content);
            reply.extend_from_slice(b")\r\n");
            reply.extend_from_slice(b"3 OK done\r\n");

            let messages = parse_messages(&reply).unwrap();
            prop_assert_eq!(messages.get(&uid.to_string()), Some(&content));
        }
    }
}

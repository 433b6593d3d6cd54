//! SEARCH reply parsing.

use crate::error::{Error, Result};
use crate::types::SequenceSet;

/// The untagged line a SEARCH reply starts with when nothing matched.
const EMPTY_RESULT_MARKER: &str = "* SEARCH";

/// Offset of the first identifier within a non-empty SEARCH data line.
const IDS_OFFSET: usize = EMPTY_RESULT_MARKER.len() + 1;

/// Extracts the matched identifiers from a SEARCH reply as a sequence set.
///
/// A first line of exactly the bare marker length means an empty result.
/// Otherwise the identifier list runs from a fixed offset to the line
/// terminator, with spaces turned into commas.
pub fn parse_sequence_set(reply: &[u8]) -> Result<SequenceSet> {
    let text = String::from_utf8_lossy(reply);
    let first_line = text.find(['\r', '\n']).map_or(&*text, |i| &text[..i]);
    if first_line.len() == EMPTY_RESULT_MARKER.len() {
        return Ok(SequenceSet::empty());
    }
    let ids = first_line.get(IDS_OFFSET..).ok_or_else(|| {
        Error::MalformedReply(format!("truncated search data line {first_line:?}"))
    })?;
    Ok(SequenceSet::from_search_ids(ids))
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
    fn test_empty_result() {
        let reply = b"* SEARCH\r\n2 OK search done\r\n";
        assert!(parse_sequence_set(reply).unwrap().is_empty());
    }

    #[test]
    fn test_identifiers_become_sequence_set() {
        let reply = b"* SEARCH 3 7 9\r\n2 OK search done\r\n";
        assert_eq!(parse_sequence_set(reply).unwrap().as_str(), "3,7,9");
    }

    #[test]
    fn test_single_identifier() {
        let reply = b"* SEARCH 12\r\n2 OK search done\r\n";
        assert_eq!(parse_sequence_set(reply).unwrap().as_str(), "12");
    }

    #[test]
    fn test_short_first_line_is_malformed() {
        let reply = b"* NONE\r\n2 OK done\r\n";
        assert!(matches!(
            parse_sequence_set(reply),
            Err(Error::MalformedReply(_))
        ));
    }
}

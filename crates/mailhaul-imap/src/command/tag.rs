//! Command tag sequencing.
//!
//! Tags correlate a command with its terminal reply line.

/// A command tag: the decimal value of a per-connection counter.
///
/// Serialized as its plain decimal string, both when prefixing an outgoing
/// command and when recognized at the start of the terminal reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(u32);

impl Tag {
    /// Creates a tag with the given counter value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the counter value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly increasing tag sequence, starting at 0.
///
/// The current tag is read when a command is built and advanced only after
/// its reply has been validated; a failed exchange never advances, and a tag
/// is never reused for a later command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSequence {
    next: u32,
}

impl TagSequence {
    /// Creates a sequence positioned at tag 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Returns the tag the next command will carry, without advancing.
    #[must_use]
    pub const fn current(&self) -> Tag {
        Tag(self.next)
    }

    /// Moves to the next tag after a validated exchange.
    ///
    /// # Panics
    ///
    /// Panics if the counter would overflow `u32::MAX`, which would require
    /// 4+ billion exchanges on a single connection.
    pub fn advance(&mut self) {
        assert!(self.next != u32::MAX, "tag counter overflow");
        self.next += 1;
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
    fn test_starts_at_zero() {
        let tags = TagSequence::new();
        assert_eq!(tags.current(), Tag::new(0));
        assert_eq!(tags.current().to_string(), "0");
    }

    #[test]
    fn test_current_does_not_advance() {
        let tags = TagSequence::new();
        let _ = tags.current();
        let _ = tags.current();
        assert_eq!(tags.current().value(), 0);
    }

    #[test]
    fn test_advance_is_strictly_incrementing() {
        let mut tags = TagSequence::new();
        for expected in 0..100 {
            assert_eq!(tags.current().value(), expected);
            tags.advance();
        }
        assert_eq!(tags.current().value(), 100);
    }

    #[test]
    fn test_decimal_display() {
        assert_eq!(Tag::new(0).to_string(), "0");
        assert_eq!(Tag::new(42).to_string(), "42");
        assert_eq!(Tag::new(1000).to_string(), "1000");
    }

    #[test]
    #[should_panic(expected = "tag counter overflow")]
    fn test_overflow_detection() {
        let mut tags = TagSequence { next: u32::MAX };
        tags.advance();
    }
}

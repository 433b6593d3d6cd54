//! Sequence sets for message identifier ranges.

/// A comma-joined set of message identifiers used as a command argument.
///
/// The engine derives these from SEARCH replies and from the well-known
/// whole-mailbox range; beyond comma separation no further structure is
/// enforced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceSet(String);

impl SequenceSet {
    /// Returns the whole-mailbox range `1:*`.
    #[must_use]
    pub fn all() -> Self {
        Self("1:*".to_string())
    }

    /// Returns a set holding no identifiers.
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Builds a set from identifiers separated by spaces, the way SEARCH
    /// reports them.
    #[must_use]
    pub fn from_search_ids(ids: &str) -> Self {
        Self(ids.replace(' ', ","))
    }

    /// Returns true if the set holds no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the set in command-argument form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
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
    fn test_all_is_whole_mailbox_range() {
        assert_eq!(SequenceSet::all().as_str(), "1:*");
    }

    #[test]
    fn test_spaces_become_commas() {
        let set = SequenceSet::from_search_ids("3 7 9");
        assert_eq!(set.as_str(), "3,7,9");
        assert!(!set.is_empty());
    }

    #[test]
    fn test_single_id_passes_through() {
        assert_eq!(SequenceSet::from_search_ids("12").as_str(), "12");
    }

    #[test]
    fn test_empty() {
        assert!(SequenceSet::empty().is_empty());
        assert_eq!(SequenceSet::empty().to_string(), "");
    }
}

//! Command builders.
//!
//! Every command serializes as `<tag><SP><name>[<SP><args>]<CRLF>` with the
//! decimal tag of the issuing session. The engine only speaks the small
//! command set it needs; there is no general-purpose command grammar here.

mod tag;

pub use tag::{Tag, TagSequence};

use crate::types::SequenceSet;

/// Which message contents a FETCH retrieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchScope {
    /// Full message source.
    #[default]
    Full,
    /// Header section only.
    Headers,
}

impl FetchScope {
    /// Returns the FETCH data item for this scope.
    #[must_use]
    pub const fn item(self) -> &'static str {
        match self {
            Self::Full => "rfc822",
            Self::Headers => "rfc822.header",
        }
    }
}

/// A protocol command this engine can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN with plaintext credentials.
    Login {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// LOGOUT, ending the session.
    Logout,
    /// SELECT a mailbox.
    Select {
        /// Mailbox name, passed through verbatim.
        mailbox: String,
    },
    /// FETCH message contents for a sequence set.
    Fetch {
        /// Messages to fetch.
        set: SequenceSet,
        /// Contents to retrieve.
        scope: FetchScope,
    },
    /// SEARCH for messages matching the `new` criterion.
    SearchNew,
}

impl Command {
    /// Serializes the command as a tagged CRLF-terminated line.
    #[must_use]
    pub fn serialize(&self, tag: Tag) -> Vec<u8> {
        let line = match self {
            Self::Login { username, password } => {
                format!("{tag} login {username} {password}\r\n")
            }
            Self::Logout => format!("{tag} logout\r\n"),
            Self::Select { mailbox } => format!("{tag} select {mailbox}\r\n"),
            Self::Fetch { set, scope } => format!("{tag} fetch {set} {}\r\n", scope.item()),
            Self::SearchNew => format!("{tag} search new\r\n"),
        };
        line.into_bytes()
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
    fn test_login_serialization() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(
            cmd.serialize(Tag::new(0)),
            b"0 login user@example.com secret\r\n"
        );
    }

    #[test]
    fn test_logout_serialization() {
        assert_eq!(Command::Logout.serialize(Tag::new(7)), b"7 logout\r\n");
    }

    #[test]
    fn test_select_serialization() {
        let cmd = Command::Select {
            mailbox: "inbox".to_string(),
        };
        assert_eq!(cmd.serialize(Tag::new(1)), b"1 select inbox\r\n");
    }

    #[test]
    fn test_fetch_whole_mailbox() {
        let cmd = Command::Fetch {
            set: SequenceSet::all(),
            scope: FetchScope::Full,
        };
        assert_eq!(cmd.serialize(Tag::new(2)), b"2 fetch 1:* rfc822\r\n");
    }

    #[test]
    fn test_fetch_headers_only() {
        let cmd = Command::Fetch {
            set: SequenceSet::from_search_ids("3 7 9"),
            scope: FetchScope::Headers,
        };
        assert_eq!(cmd.serialize(Tag::new(4)), b"4 fetch 3,7,9 rfc822.header\r\n");
    }

    #[test]
    fn test_search_new_serialization() {
        assert_eq!(Command::SearchNew.serialize(Tag::new(3)), b"3 search new\r\n");
    }
}

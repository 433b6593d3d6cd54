//! Protocol session: the state machine over one exclusive connection.
//!
//! A session owns the transport, the tag sequence, and the
//! authentication/mailbox state. Every operation is a single tagged
//! exchange, validated before the tag advances; a failed exchange leaves
//! the tag untouched. There is no reconnection and no command re-issue —
//! a validated failure surfaces as a typed error and leaves the caller in
//! charge. Dropping the session closes the connection; call [`logout`]
//! first for a clean exit.
//!
//! [`logout`]: Session::logout

use tokio::io::{AsyncRead, AsyncWrite};

use super::config::{Config, Security};
use super::framed::FramedStream;
use super::stream::{ImapStream, connect_plain, connect_tls};
use crate::command::{Command, FetchScope, Tag, TagSequence};
use crate::parser;
use crate::types::{MessageMap, SelectedMailbox, SequenceSet};
use crate::{Error, Result};

/// A protocol session over one connection.
pub struct Session<S> {
    stream: FramedStream<S>,
    tags: TagSequence,
    authenticated: bool,
    mailbox: Option<SelectedMailbox>,
}

impl Session<ImapStream> {
    /// Connects per the configuration and consumes the server greeting.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = match config.security {
            Security::Tls => connect_tls(&config.host, config.port, &config.trust).await?,
            Security::None => connect_plain(&config.host, config.port).await?,
        };
        Self::from_stream(stream, config).await
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-connected stream and consumes the greeting.
    pub async fn from_stream(stream: S, config: &Config) -> Result<Self> {
        let mut stream = FramedStream::with_limits(stream, config.chunk_size, config.max_retries);
        let greeting = stream.read_greeting().await?;
        tracing::debug!(bytes = greeting.len(), "greeting consumed");

        Ok(Self {
            stream,
            tags: TagSequence::new(),
            authenticated: false,
            mailbox: None,
        })
    }

    /// Returns true once a LOGIN has been validated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns the selected mailbox, if any.
    #[must_use]
    pub const fn mailbox(&self) -> Option<&SelectedMailbox> {
        self.mailbox.as_ref()
    }

    /// Returns true when the selected mailbox is known to hold no messages.
    ///
    /// Also true before any SELECT, matching the fetch precondition.
    #[must_use]
    pub fn mailbox_is_empty(&self) -> bool {
        self.mailbox.as_ref().is_none_or(SelectedMailbox::is_empty)
    }

    /// Returns the tag the next command will carry.
    #[must_use]
    pub const fn next_tag(&self) -> Tag {
        self.tags.current()
    }

    /// Authenticates with LOGIN.
    ///
    /// Re-login over an already authenticated session is permitted and
    /// simply re-runs the exchange.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let (tag, reply) = self.exchange(&command).await?;
        if !parser::has_ok_status(&reply, tag) {
            return Err(Error::Auth(status_text(&reply)));
        }

        self.authenticated = true;
        self.tags.advance();
        tracing::debug!(username, "logged in");
        Ok(())
    }

    /// Ends the authenticated session with LOGOUT.
    pub async fn logout(&mut self) -> Result<()> {
        let (tag, reply) = self.exchange(&Command::Logout).await?;
        if !parser::has_ok_status(&reply, tag) {
            return Err(Error::Logout(status_text(&reply)));
        }

        self.authenticated = false;
        self.mailbox = None;
        self.tags.advance();
        Ok(())
    }

    /// Selects a mailbox and returns its message count.
    ///
    /// No local precondition: an unauthenticated SELECT is rejected by the
    /// server and surfaces as [`Error::Select`].
    pub async fn select(&mut self, mailbox: &str) -> Result<u32> {
        let command = Command::Select {
            mailbox: mailbox.to_string(),
        };
        let (tag, reply) = self.exchange(&command).await?;
        if !parser::has_ok_status(&reply, tag) {
            return Err(Error::Select(status_text(&reply)));
        }

        let exists = parser::parse_exists(&reply)?;
        self.mailbox = Some(SelectedMailbox::new(mailbox, exists));
        self.tags.advance();
        tracing::debug!(mailbox, exists, "mailbox selected");
        Ok(exists)
    }

    /// Fetches every message in the selected mailbox.
    pub async fn fetch_all(&mut self, scope: FetchScope) -> Result<MessageMap> {
        self.check_fetch_preconditions()?;
        self.fetch(SequenceSet::all(), scope).await
    }

    /// Fetches only new messages in the selected mailbox.
    ///
    /// Runs a SEARCH first; when nothing is new, returns an empty map
    /// without issuing a FETCH.
    pub async fn fetch_new(&mut self, scope: FetchScope) -> Result<MessageMap> {
        self.check_fetch_preconditions()?;

        let set = self.search_new().await?;
        if set.is_empty() {
            return Ok(MessageMap::new());
        }
        self.fetch(set, scope).await
    }

    /// Searches for new messages and returns their identifiers.
    pub async fn search_new(&mut self) -> Result<SequenceSet> {
        if !self.authenticated {
            return Err(Error::NotAuthenticated);
        }

        let (tag, reply) = self.exchange(&Command::SearchNew).await?;
        if !parser::has_ok_status(&reply, tag) {
            return Err(Error::Search(status_text(&reply)));
        }

        let set = parser::parse_sequence_set(&reply)?;
        self.tags.advance();
        Ok(set)
    }

    /// Runs the validated FETCH exchange shared by `fetch_all`/`fetch_new`.
    async fn fetch(&mut self, set: SequenceSet, scope: FetchScope) -> Result<MessageMap> {
        let command = Command::Fetch { set, scope };
        let (tag, reply) = self.exchange(&command).await?;
        if !parser::has_ok_status(&reply, tag) {
            return Err(Error::Fetch(status_text(&reply)));
        }

        let messages = parser::parse_messages(&reply)?;
        self.tags.advance();
        tracing::debug!(count = messages.len(), "messages fetched");
        Ok(messages)
    }

    /// Runs one exchange for `command` without advancing the tag.
    async fn exchange(&mut self, command: &Command) -> Result<(Tag, Vec<u8>)> {
        let tag = self.tags.current();
        let reply = self.stream.exchange(tag, &command.serialize(tag)).await?;
        Ok((tag, reply))
    }

    fn check_fetch_preconditions(&self) -> Result<()> {
        if !self.authenticated {
            return Err(Error::NotAuthenticated);
        }
        if self.mailbox_is_empty() {
            return Err(Error::EmptyMailbox);
        }
        Ok(())
    }
}

/// Terminal status line of a completed reply, trimmed for error payloads.
fn status_text(reply: &[u8]) -> String {
    String::from_utf8_lossy(parser::frame::last_line(reply))
        .trim_end()
        .to_string()
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
    use tokio_test::io::{Builder, Mock};

    use super::*;

    async fn session(mock: Mock) -> Session<Mock> {
        let config = Config::new("test.invalid");
        Session::from_stream(mock, &config).await.unwrap()
    }

    #[tokio::test]
    async fn test_greeting_is_consumed_on_construction() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let session = session(mock).await;

        assert!(!session.is_authenticated());
        assert!(session.mailbox().is_none());
        assert_eq!(session.next_tag(), Tag::new(0));
    }

    #[tokio::test]
    async fn test_login_success_advances_tag() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.next_tag(), Tag::new(1));
    }

    #[tokio::test]
    async fn test_login_failure_keeps_tag_and_state() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user wrong\r\n")
            .read(b"0 NO [AUTHENTICATIONFAILED] invalid credentials\r\n")
            .write(b"0 login user right\r\n")
            .read(b"0 OK logged in\r\n")
            .build();
        let mut session = session(mock).await;

        let err = session.login("user", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(!session.is_authenticated());
        assert_eq!(session.next_tag(), Tag::new(0));

        // The failed tag is reused for the retry; it was never consumed.
        session.login("user", "right").await.unwrap();
        assert_eq!(session.next_tag(), Tag::new(1));
    }

    #[tokio::test]
    async fn test_logout_clears_state() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .write(b"1 select inbox\r\n")
            .read(b"* 3 EXISTS\r\n1 OK selected\r\n")
            .write(b"2 logout\r\n")
            .read(b"* BYE\r\n2 OK bye\r\n")
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        session.select("inbox").await.unwrap();
        session.logout().await.unwrap();

        assert!(!session.is_authenticated());
        assert!(session.mailbox().is_none());
        assert_eq!(session.next_tag(), Tag::new(3));
    }

    #[tokio::test]
    async fn test_logout_rejection() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 logout\r\n")
            .read(b"0 BAD not today\r\n")
            .build();
        let mut session = session(mock).await;

        let err = session.logout().await.unwrap_err();
        assert!(matches!(err, Error::Logout(_)));
        assert_eq!(session.next_tag(), Tag::new(0));
    }

    #[tokio::test]
    async fn test_select_records_count_and_emptiness() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 select inbox\r\n")
            .read(b"* 42 EXISTS\r\n0 OK [READ-WRITE] selected\r\n")
            .build();
        let mut session = session(mock).await;

        let exists = session.select("inbox").await.unwrap();
        assert_eq!(exists, 42);
        let mailbox = session.mailbox().unwrap();
        assert_eq!(mailbox.name(), "inbox");
        assert!(!session.mailbox_is_empty());
        assert_eq!(session.next_tag(), Tag::new(1));
    }

    #[tokio::test]
    async fn test_select_empty_mailbox() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 select inbox\r\n")
            .read(b"* 0 EXISTS\r\n0 OK selected\r\n")
            .build();
        let mut session = session(mock).await;

        assert_eq!(session.select("inbox").await.unwrap(), 0);
        assert!(session.mailbox_is_empty());
    }

    #[tokio::test]
    async fn test_select_without_exists_line_is_malformed_and_keeps_tag() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 select inbox\r\n")
            .read(b"0 OK selected\r\n")
            .build();
        let mut session = session(mock).await;

        let err = session.select("inbox").await.unwrap_err();
        assert!(matches!(err, Error::MalformedReply(_)));
        assert!(session.mailbox().is_none());
        assert_eq!(session.next_tag(), Tag::new(0));
    }

    #[tokio::test]
    async fn test_fetch_all_requires_login() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut session = session(mock).await;

        let err = session.fetch_all(FetchScope::Full).await.unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_fetch_all_requires_non_empty_mailbox() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .write(b"1 select inbox\r\n")
            .read(b"* 0 EXISTS\r\n1 OK selected\r\n")
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        session.select("inbox").await.unwrap();

        let err = session.fetch_all(FetchScope::Full).await.unwrap_err();
        assert!(matches!(err, Error::EmptyMailbox));
    }

    #[tokio::test]
    async fn test_fetch_before_select_is_empty_mailbox() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        let err = session.fetch_all(FetchScope::Full).await.unwrap_err();
        assert!(matches!(err, Error::EmptyMailbox));
    }

    #[tokio::test]
    async fn test_fetch_all_parses_messages() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .write(b"1 select inbox\r\n")
            .read(b"* 2 EXISTS\r\n1 OK selected\r\n")
            .write(b"2 fetch 1:* rfc822\r\n")
            .read(
                b"* 1 FETCH (UID 10 RFC822 {5}\r\nhello)\r\n\
                  * 2 FETCH (UID 11 RFC822 {7}\r\nbye\r\nok)\r\n\
                  2 OK fetch done\r\n",
            )
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        session.select("inbox").await.unwrap();
        let messages = session.fetch_all(FetchScope::Full).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages["10"], b"hello");
        assert_eq!(messages["11"], b"bye\r\nok");
        assert_eq!(session.next_tag(), Tag::new(3));
    }

    #[tokio::test]
    async fn test_fetch_rejection_keeps_tag() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .write(b"1 select inbox\r\n")
            .read(b"* 1 EXISTS\r\n1 OK selected\r\n")
            .write(b"2 fetch 1:* rfc822\r\n")
            .read(b"2 NO fetch refused\r\n")
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        session.select("inbox").await.unwrap();

        let err = session.fetch_all(FetchScope::Full).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(session.next_tag(), Tag::new(2));
    }

    #[tokio::test]
    async fn test_fetch_new_short_circuits_on_empty_search() {
        // No FETCH write is scripted: issuing one would panic the mock.
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .write(b"1 select inbox\r\n")
            .read(b"* 5 EXISTS\r\n1 OK selected\r\n")
            .write(b"2 search new\r\n")
            .read(b"* SEARCH\r\n2 OK search done\r\n")
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        session.select("inbox").await.unwrap();
        let messages = session.fetch_new(FetchScope::Full).await.unwrap();

        assert!(messages.is_empty());
        assert_eq!(session.next_tag(), Tag::new(3));
    }

    #[tokio::test]
    async fn test_fetch_new_fetches_searched_set() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .write(b"1 select inbox\r\n")
            .read(b"* 5 EXISTS\r\n1 OK selected\r\n")
            .write(b"2 search new\r\n")
            .read(b"* SEARCH 3 7 9\r\n2 OK search done\r\n")
            .write(b"3 fetch 3,7,9 rfc822.header\r\n")
            .read(b"* 3 FETCH (UID 3 RFC822.HEADER {4}\r\nabcd)\r\n3 OK done\r\n")
            .build();
        let mut session = session(mock).await;

        session.login("user", "secret").await.unwrap();
        session.select("inbox").await.unwrap();
        let messages = session.fetch_new(FetchScope::Headers).await.unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages["3"], b"abcd");
        assert_eq!(session.next_tag(), Tag::new(4));
    }

    #[tokio::test]
    async fn test_search_new_requires_login() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut session = session(mock).await;

        let err = session.search_new().await.unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_tag_increases_by_one_per_validated_exchange() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"0 login user secret\r\n")
            .read(b"0 OK logged in\r\n")
            .write(b"1 select inbox\r\n")
            .read(b"* 1 EXISTS\r\n1 OK selected\r\n")
            .write(b"2 search new\r\n")
            .read(b"* SEARCH\r\n2 OK done\r\n")
            .write(b"3 logout\r\n")
            .read(b"3 OK bye\r\n")
            .build();
        let mut session = session(mock).await;

        assert_eq!(session.next_tag(), Tag::new(0));
        session.login("user", "secret").await.unwrap();
        assert_eq!(session.next_tag(), Tag::new(1));
        session.select("inbox").await.unwrap();
        assert_eq!(session.next_tag(), Tag::new(2));
        session.search_new().await.unwrap();
        assert_eq!(session.next_tag(), Tag::new(3));
        session.logout().await.unwrap();
        assert_eq!(session.next_tag(), Tag::new(4));
    }
}

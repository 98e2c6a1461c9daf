//! Mailbox session boundary.
//!
//! The sync engine consumes an already-authenticated session through this
//! trait; connection setup, OAuth2/XOAUTH2 and app-password flows live with
//! the caller. Implementations map their protocol errors to
//! [`Error::Mailbox`].

use async_trait::async_trait;
use traccia_core::Error;

/// Header fields fetched during the cheap relevance pass.
#[derive(Debug, Clone)]
pub struct MessageHeader {
    /// Message id, unique within its folder.
    pub id: String,
    pub subject: String,
    /// Raw Date header value.
    pub date: String,
}

/// An authenticated IMAP-like mailbox session.
///
/// Header and body fetches are separate on purpose: headers are fetched for
/// every recent message, full bodies only for the few that pass the
/// relevance filter.
#[async_trait]
pub trait MailboxSession: Send {
    /// All folder names visible to the account.
    async fn list_folders(&mut self) -> Result<Vec<String>, Error>;

    /// Open a folder read-only for the following calls.
    async fn select(&mut self, folder: &str) -> Result<(), Error>;

    /// Ids of messages received on or after the given date in the selected
    /// folder. `since_token` is a ready-made IMAP SINCE date
    /// (see [`crate::folders::format_since_date`]); the engine formats it so
    /// no implementation is tempted to use locale-dependent formatting.
    async fn search_since(&mut self, since_token: &str) -> Result<Vec<String>, Error>;

    /// Headers for the given message ids.
    async fn fetch_headers(&mut self, ids: &[String]) -> Result<Vec<MessageHeader>, Error>;

    /// Full decoded body of one message.
    async fn fetch_body(&mut self, id: &str) -> Result<String, Error>;

    /// Terminate the session. Best-effort; errors are logged, not surfaced.
    async fn logout(&mut self) -> Result<(), Error>;
}

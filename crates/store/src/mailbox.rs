/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::future::Future;
use types::Kind;

/// Metadata the mailbox store threads through to the CardDAV index as a
/// side effect of an append, mirroring how a real Cyrus mailbox append
/// triggers the DAV-index update hook inline with the transaction. A plain
/// IMAP append outside this crate's scope would pass `None`.
#[derive(Debug, Clone, Copy)]
pub struct CardIndexHint<'a> {
    pub uid: &'a str,
    pub kind: Kind,
}

/// Mailbox entry record returned by `list_mailboxes`.
#[derive(Debug, Clone)]
pub struct MailboxSummary {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub role: Option<String>,
    pub may_add_messages: bool,
    pub may_remove_messages: bool,
    pub may_create_child: bool,
    pub may_delete_mailbox: bool,
    pub total_messages: u64,
    pub unread_messages: u64,
}

/// Outcome of staging and appending a message.
#[derive(Debug, Clone)]
pub struct AppendedMessage {
    pub imap_uid: u32,
    pub resource: String,
    pub modseq: u64,
}

/// A fetched message's body plus the flag/annotation state the contact
/// mapper needs alongside the parsed vCard (`isFlagged`, `x-importance`
/// never live in the vCard body itself).
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub rfc822: Vec<u8>,
    pub flagged: bool,
    pub importance: Option<f64>,
}

/// RAII handle on the user inbox's intent-write lock. Its sole purpose is
/// to freeze the user's inbox modseq as a coherent baseline for the
/// duration of a batch; it does not gate reads and it does not reach into
/// address-book mailboxes. Dropping it releases the lock.
pub struct InboxGuard {
    _permit: tokio::sync::OwnedMutexGuard<()>,
}

impl InboxGuard {
    pub fn new(permit: tokio::sync::OwnedMutexGuard<()>) -> Self {
        InboxGuard { _permit: permit }
    }
}

/// The mailbox store interface consumed by the batch executor, the mailbox
/// lister, and the contact/group set engine. A single implementation backs
/// an entire account; mailbox names are the store's native namespace
/// (`user/<user>/#addressbooks/<abook>`, `user/<user>/INBOX`, ...).
pub trait MailStore: Sync + Send {
    /// Acquire the account's inbox intent-write lock.
    fn lock_inbox<'a>(&'a self, account: &'a str) -> impl Future<Output = trc::Result<InboxGuard>> + Send + 'a;

    /// The account's inbox mailbox name, frozen by [`lock_inbox`] and read
    /// by [`modseq`] to produce the batch's state token. Given as a default
    /// so a backend only overrides it if its native inbox naming differs.
    fn inbox_mailbox(&self, account: &str) -> String {
        let _ = account;
        "INBOX".to_string()
    }

    /// Current modseq of the named mailbox, re-read fresh on every call so
    /// handlers that advance modseq via their own appends are reflected
    /// immediately.
    fn modseq<'a>(&'a self, account: &'a str, mailbox: &'a str) -> impl Future<Output = trc::Result<u64>> + Send + 'a;

    /// Resolve `addressbookId` (the tail of the mailbox name, defaulting to
    /// `"Default"`) to the store's full internal mailbox name.
    fn addressbook_mailbox(&self, account: &str, addressbook_id: &str) -> String;

    /// Walk every mailbox visible to the account, ACL-filtered by the store
    /// itself — mailboxes lacking both lookup and read rights are simply
    /// omitted from the returned list.
    fn list_mailboxes<'a>(&'a self, account: &'a str) -> impl Future<Output = trc::Result<Vec<MailboxSummary>>> + Send + 'a;

    /// Stage an RFC-822-framed message body and append it to `mailbox`,
    /// preserving `resource_name` across an update when given. Commits the
    /// append transaction before returning.
    fn append<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        rfc822: &'a [u8],
        resource_name: Option<&'a str>,
        index_hint: Option<CardIndexHint<'a>>,
    ) -> impl Future<Output = trc::Result<AppendedMessage>> + Send + 'a;

    /// Fetch a previously-appended message's RFC-822 body plus its current
    /// flag/annotation state, so the set engine can re-parse and diff it.
    fn fetch<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        imap_uid: u32,
    ) -> impl Future<Output = trc::Result<MessageRecord>> + Send + 'a;

    /// Expunge a message by its IMAP UID. `unbind` marks the expunge with
    /// the `$dav-unbind` user flag so the CardDAV index keeps the UID
    /// "alive" across a same-mailbox replace.
    fn expunge<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        imap_uid: u32,
        unbind: bool,
    ) -> impl Future<Output = trc::Result<()>> + Send + 'a;

    /// Set or clear the IMAP `\Flagged` flag on a message in place, without
    /// touching its body (the "no content" fast path).
    fn set_flagged<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        imap_uid: u32,
        flagged: bool,
    ) -> impl Future<Output = trc::Result<()>> + Send + 'a;

    /// Set or clear the `x-importance` shared annotation in place.
    fn set_importance<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        imap_uid: u32,
        importance: Option<f64>,
    ) -> impl Future<Output = trc::Result<()>> + Send + 'a;
}

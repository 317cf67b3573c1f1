/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::future::Future;
use types::Kind;

/// A single CardDAV index row. A plain, ownable value rather than the
/// row-callback-with-opaque-context idiom a C index implementation would
/// use.
#[derive(Debug, Clone)]
pub struct CardMetadata {
    pub uid: String,
    pub mailbox: String,
    pub imap_uid: u32,
    pub resource: String,
    pub kind: Kind,
    pub alive: bool,
    /// The modseq at which this row's tombstone (if `!alive`) or last
    /// modification was recorded, used by `get_updates`.
    pub modseq: u64,
}

/// The CardDAV metadata index interface: maps vCard UIDs to their current
/// mailbox/IMAP-UID location, independent of the mailbox store's own
/// record layout.
pub trait CardDavIndex: Sync + Send {
    /// Every live card of `kind` in `mailbox`, as an owned, already-materialized
    /// sequence rather than a row-callback.
    fn get_cards<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        kind: Kind,
    ) -> impl Future<Output = trc::Result<Vec<CardMetadata>>> + Send + 'a;

    /// Every card of `kind` whose tombstone or last-modified modseq is
    /// strictly greater than `since_modseq`, tombstoned rows included with
    /// `alive = false`.
    fn get_updates<'a>(
        &'a self,
        account: &'a str,
        since_modseq: u64,
        kind: Kind,
    ) -> impl Future<Output = trc::Result<Vec<CardMetadata>>> + Send + 'a;

    /// Resolve a UID to its current location, if any (alive or tombstoned).
    fn lookup_uid<'a>(&'a self, account: &'a str, uid: &'a str) -> impl Future<Output = trc::Result<Option<CardMetadata>>> + Send + 'a;
}

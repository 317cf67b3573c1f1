/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! An in-memory reference implementation of [`MailStore`] and
//! [`CardDavIndex`], used by the JMAP layer's own tests and by
//! `crates/main`'s demo binary. Not a teaching example of a production
//! mailbox store — those live behind the same trait in a real deployment.

use crate::{
    carddav::{CardDavIndex, CardMetadata},
    mailbox::{AppendedMessage, CardIndexHint, InboxGuard, MailStore, MailboxSummary, MessageRecord},
};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use types::Kind;

struct MessageData {
    imap_uid: u32,
    resource: String,
    rfc822: Vec<u8>,
    flagged: bool,
    importance: Option<f64>,
    expunged: bool,
    uid: Option<String>,
    kind: Option<Kind>,
    modseq: u64,
}

struct MailboxData {
    id: String,
    parent_id: Option<String>,
    role: Option<String>,
    messages: Vec<MessageData>,
    next_uid: u32,
}

impl MailboxData {
    fn new(id: impl Into<String>, parent_id: Option<String>, role: Option<String>) -> Self {
        MailboxData {
            id: id.into(),
            parent_id,
            role,
            messages: Vec::new(),
            next_uid: 1,
        }
    }
}

struct AccountData {
    inbox_lock: Arc<tokio::sync::Mutex<()>>,
    modseq: AtomicU64,
    mailboxes: AHashMap<String, MailboxData>,
    tombstones: Vec<CardMetadata>,
}

impl AccountData {
    fn new() -> Self {
        let mut mailboxes = AHashMap::default();
        mailboxes.insert(
            "INBOX".to_string(),
            MailboxData::new("inbox", None, Some("inbox".to_string())),
        );
        AccountData {
            inbox_lock: Arc::new(tokio::sync::Mutex::new(())),
            modseq: AtomicU64::new(1),
            mailboxes,
            tombstones: Vec::new(),
        }
    }

    fn bump_modseq(&self) -> u64 {
        self.modseq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// A single-process, in-memory mailbox store + CardDAV index keyed by
/// account name. Every mutation bumps one account-wide modseq counter, so
/// the "state" token is a single monotonically non-decreasing sequence
/// shared across the account's mailboxes (Cyrus's highest-modseq domain is
/// effectively per-account, not per-mailbox, for this purpose).
pub struct MemoryBackend {
    addressbook_prefix: String,
    accounts: Mutex<AHashMap<String, Arc<tokio::sync::Mutex<AccountData>>>>,
}

impl MemoryBackend {
    pub fn new(addressbook_prefix: impl Into<String>) -> Self {
        MemoryBackend {
            addressbook_prefix: addressbook_prefix.into(),
            accounts: Mutex::new(AHashMap::default()),
        }
    }

    fn account(&self, account: &str) -> Arc<tokio::sync::Mutex<AccountData>> {
        self.accounts
            .lock()
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(AccountData::new())))
            .clone()
    }
}

impl MailStore for MemoryBackend {
    async fn lock_inbox<'a>(&'a self, account: &'a str) -> trc::Result<InboxGuard> {
        let data = self.account(account);
        let lock = data.lock().await.inbox_lock.clone();
        let permit = lock.lock_owned().await;
        Ok(InboxGuard::new(permit))
    }

    async fn modseq<'a>(&'a self, account: &'a str, _mailbox: &'a str) -> trc::Result<u64> {
        let data = self.account(account);
        let data = data.lock().await;
        Ok(data.modseq.load(Ordering::SeqCst))
    }

    fn addressbook_mailbox(&self, account: &str, addressbook_id: &str) -> String {
        format!(
            "user/{account}/{}/{addressbook_id}",
            self.addressbook_prefix
        )
    }

    async fn list_mailboxes<'a>(&'a self, account: &'a str) -> trc::Result<Vec<MailboxSummary>> {
        let data = self.account(account);
        let data = data.lock().await;
        Ok(data
            .mailboxes
            .iter()
            .map(|(name, mbox)| {
                let unread = mbox.messages.iter().filter(|m| !m.expunged).count() as u64;
                MailboxSummary {
                    id: mbox.id.clone(),
                    name: name.clone(),
                    parent_id: mbox.parent_id.clone(),
                    role: mbox.role.clone(),
                    may_add_messages: true,
                    may_remove_messages: true,
                    may_create_child: true,
                    may_delete_mailbox: mbox.role.is_none(),
                    total_messages: mbox.messages.iter().filter(|m| !m.expunged).count() as u64,
                    unread_messages: unread,
                }
            })
            .collect())
    }

    async fn append<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        rfc822: &'a [u8],
        resource_name: Option<&'a str>,
        index_hint: Option<CardIndexHint<'a>>,
    ) -> trc::Result<AppendedMessage> {
        let data = self.account(account);
        let mut data = data.lock().await;
        let modseq = data.bump_modseq();
        let mbox = data
            .mailboxes
            .entry(mailbox.to_string())
            .or_insert_with(|| MailboxData::new(mailbox.to_string(), None, None));
        let imap_uid = mbox.next_uid;
        mbox.next_uid += 1;
        let resource = resource_name
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("{imap_uid}.vcf"));
        mbox.messages.push(MessageData {
            imap_uid,
            resource: resource.clone(),
            rfc822: rfc822.to_vec(),
            flagged: false,
            importance: None,
            expunged: false,
            uid: index_hint.map(|h| h.uid.to_string()),
            kind: index_hint.map(|h| h.kind),
            modseq,
        });
        Ok(AppendedMessage {
            imap_uid,
            resource,
            modseq,
        })
    }

    async fn fetch<'a>(&'a self, account: &'a str, mailbox: &'a str, imap_uid: u32) -> trc::Result<MessageRecord> {
        let data = self.account(account);
        let data = data.lock().await;
        let mbox = data
            .mailboxes
            .get(mailbox)
            .ok_or_else(|| trc::Error::store(format!("no such mailbox: {mailbox}")))?;
        let msg = mbox
            .messages
            .iter()
            .find(|m| m.imap_uid == imap_uid && !m.expunged)
            .ok_or_else(|| trc::Error::store("no such message"))?;
        Ok(MessageRecord {
            rfc822: msg.rfc822.clone(),
            flagged: msg.flagged,
            importance: msg.importance,
        })
    }

    async fn expunge<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        imap_uid: u32,
        unbind: bool,
    ) -> trc::Result<()> {
        let data = self.account(account);
        let mut data = data.lock().await;
        let modseq = data.bump_modseq();
        let mbox = data
            .mailboxes
            .get_mut(mailbox)
            .ok_or_else(|| trc::Error::store(format!("no such mailbox: {mailbox}")))?;
        let msg = mbox
            .messages
            .iter_mut()
            .find(|m| m.imap_uid == imap_uid && !m.expunged)
            .ok_or_else(|| trc::Error::store("no such message"))?;
        msg.expunged = true;
        let tombstone = match (&msg.uid, msg.kind) {
            (Some(uid), Some(kind)) if !unbind => Some(CardMetadata {
                uid: uid.clone(),
                mailbox: mailbox.to_string(),
                imap_uid,
                resource: msg.resource.clone(),
                kind,
                alive: false,
                modseq,
            }),
            _ => None,
        };
        if let Some(tombstone) = tombstone {
            data.tombstones.push(tombstone);
        }
        Ok(())
    }

    async fn set_flagged<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        imap_uid: u32,
        flagged: bool,
    ) -> trc::Result<()> {
        let data = self.account(account);
        let mut data = data.lock().await;
        let modseq = data.bump_modseq();
        let mbox = data
            .mailboxes
            .get_mut(mailbox)
            .ok_or_else(|| trc::Error::store(format!("no such mailbox: {mailbox}")))?;
        let msg = mbox
            .messages
            .iter_mut()
            .find(|m| m.imap_uid == imap_uid && !m.expunged)
            .ok_or_else(|| trc::Error::store("no such message"))?;
        msg.flagged = flagged;
        msg.modseq = modseq;
        Ok(())
    }

    async fn set_importance<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        imap_uid: u32,
        importance: Option<f64>,
    ) -> trc::Result<()> {
        let data = self.account(account);
        let mut data = data.lock().await;
        let modseq = data.bump_modseq();
        let mbox = data
            .mailboxes
            .get_mut(mailbox)
            .ok_or_else(|| trc::Error::store(format!("no such mailbox: {mailbox}")))?;
        let msg = mbox
            .messages
            .iter_mut()
            .find(|m| m.imap_uid == imap_uid && !m.expunged)
            .ok_or_else(|| trc::Error::store("no such message"))?;
        msg.importance = importance;
        msg.modseq = modseq;
        Ok(())
    }
}

impl CardDavIndex for MemoryBackend {
    async fn get_cards<'a>(
        &'a self,
        account: &'a str,
        mailbox: &'a str,
        kind: Kind,
    ) -> trc::Result<Vec<CardMetadata>> {
        let data = self.account(account);
        let data = data.lock().await;
        let Some(mbox) = data.mailboxes.get(mailbox) else {
            return Ok(Vec::new());
        };
        Ok(mbox
            .messages
            .iter()
            .filter(|m| !m.expunged && m.kind == Some(kind))
            .map(|m| CardMetadata {
                uid: m.uid.clone().unwrap_or_default(),
                mailbox: mailbox.to_string(),
                imap_uid: m.imap_uid,
                resource: m.resource.clone(),
                kind,
                alive: true,
                modseq: m.modseq,
            })
            .collect())
    }

    async fn get_updates<'a>(
        &'a self,
        account: &'a str,
        since_modseq: u64,
        kind: Kind,
    ) -> trc::Result<Vec<CardMetadata>> {
        let data = self.account(account);
        let data = data.lock().await;
        let mut out = Vec::new();
        for (mailbox, mbox) in data.mailboxes.iter() {
            for m in mbox.messages.iter() {
                if !m.expunged && m.kind == Some(kind) && m.modseq > since_modseq {
                    out.push(CardMetadata {
                        uid: m.uid.clone().unwrap_or_default(),
                        mailbox: mailbox.clone(),
                        imap_uid: m.imap_uid,
                        resource: m.resource.clone(),
                        kind,
                        alive: true,
                        modseq: m.modseq,
                    });
                }
            }
        }
        out.extend(
            data.tombstones
                .iter()
                .filter(|t| t.kind == kind && t.modseq > since_modseq)
                .cloned(),
        );
        Ok(out)
    }

    async fn lookup_uid<'a>(&'a self, account: &'a str, uid: &'a str) -> trc::Result<Option<CardMetadata>> {
        let data = self.account(account);
        let data = data.lock().await;
        for (mailbox, mbox) in data.mailboxes.iter() {
            for m in mbox.messages.iter() {
                if !m.expunged && m.uid.as_deref() == Some(uid) {
                    return Ok(Some(CardMetadata {
                        uid: uid.to_string(),
                        mailbox: mailbox.clone(),
                        imap_uid: m.imap_uid,
                        resource: m.resource.clone(),
                        kind: m.kind.unwrap(),
                        alive: true,
                        modseq: m.modseq,
                    }));
                }
            }
        }
        Ok(data
            .tombstones
            .iter()
            .filter(|t| t.uid == uid)
            .max_by_key(|t| t.modseq)
            .cloned())
    }
}

impl PartialEq for CardMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.mailbox == other.mailbox
            && self.imap_uid == other.imap_uid
            && self.alive == other.alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint<'a>(uid: &'a str) -> CardIndexHint<'a> {
        CardIndexHint {
            uid,
            kind: Kind::Contact,
        }
    }

    #[tokio::test]
    async fn append_then_get_cards_sees_it() {
        let store = MemoryBackend::new("#addressbooks");
        let mailbox = store.addressbook_mailbox("alice", "Default");
        store
            .append("alice", &mailbox, b"BEGIN:VCARD\r\nEND:VCARD\r\n", None, Some(hint("u1")))
            .await
            .unwrap();
        let cards = store
            .get_cards("alice", &mailbox, Kind::Contact)
            .await
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].uid, "u1");
        assert!(cards[0].alive);
    }

    #[tokio::test]
    async fn move_produces_alive_and_tombstone_since_start() {
        let store = MemoryBackend::new("#addressbooks");
        let default_mb = store.addressbook_mailbox("alice", "Default");
        let work_mb = store.addressbook_mailbox("alice", "Work");
        let appended = store
            .append("alice", &default_mb, b"x", None, Some(hint("u1")))
            .await
            .unwrap();
        let since = store.modseq("alice", &default_mb).await.unwrap();

        store
            .append("alice", &work_mb, b"x", None, Some(hint("u1")))
            .await
            .unwrap();
        store
            .expunge("alice", &default_mb, appended.imap_uid, false)
            .await
            .unwrap();

        let updates = store
            .get_updates("alice", since, Kind::Contact)
            .await
            .unwrap();
        assert!(updates.iter().any(|c| c.uid == "u1" && c.alive));
        assert!(updates.iter().any(|c| c.uid == "u1" && !c.alive));
    }

    #[tokio::test]
    async fn fetch_returns_the_appended_body() {
        let store = MemoryBackend::new("#addressbooks");
        let mailbox = store.addressbook_mailbox("alice", "Default");
        let appended = store
            .append("alice", &mailbox, b"BEGIN:VCARD\r\nEND:VCARD\r\n", None, Some(hint("u1")))
            .await
            .unwrap();
        let record = store.fetch("alice", &mailbox, appended.imap_uid).await.unwrap();
        assert_eq!(record.rfc822, b"BEGIN:VCARD\r\nEND:VCARD\r\n");
        assert!(!record.flagged);
    }

    #[tokio::test]
    async fn unbind_expunge_does_not_tombstone() {
        let store = MemoryBackend::new("#addressbooks");
        let mailbox = store.addressbook_mailbox("alice", "Default");
        let since = store.modseq("alice", &mailbox).await.unwrap();
        let appended = store
            .append("alice", &mailbox, b"x", None, Some(hint("u1")))
            .await
            .unwrap();
        store
            .append("alice", &mailbox, b"y", None, Some(hint("u1")))
            .await
            .unwrap();
        store
            .expunge("alice", &mailbox, appended.imap_uid, true)
            .await
            .unwrap();

        let updates = store
            .get_updates("alice", since, Kind::Contact)
            .await
            .unwrap();
        assert!(!updates.iter().any(|c| !c.alive));
    }
}

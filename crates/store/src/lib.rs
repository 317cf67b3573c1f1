/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! The external collaborators this crate treats as fixed interfaces: the
//! mailbox store (locking, modseq, append/expunge, ACLs) and the CardDAV
//! metadata index. Both are expressed as traits, with a single in-memory
//! reference implementation used by the JMAP layer's own tests and by
//! `crates/main`'s demo binary.

pub mod carddav;
pub mod mailbox;
pub mod memory;

pub use carddav::{CardDavIndex, CardMetadata};
pub use mailbox::{AppendedMessage, CardIndexHint, InboxGuard, MailStore, MailboxSummary, MessageRecord};

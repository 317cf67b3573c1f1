/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! The request-processing core: the batch executor (request parsing, inbox
//! lock, state snapshot, idmap lifecycle, per-invocation isolation) and the
//! method handlers it dispatches to — `getMailboxes`, and the `get`/
//! `getUpdates`/`set` triad for contacts and contact groups.

pub mod contact;
pub mod executor;
pub mod group;
pub mod mailbox;
mod util;

pub use executor::{execute_batch, BatchOutcome};

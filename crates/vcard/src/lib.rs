/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Bidirectional mapping between JMAP contact/contact-group JSON objects
//! and vCard 3.0 property lists, including the Apple/Fastmail extension
//! parameters used to round-trip partial dates, social profiles, and group
//! membership.

pub mod contact;
pub mod date;
pub mod group;
pub mod raw;

pub use contact::MapResult;
pub use date::PartialDate;
pub use raw::{RawCard, RawProperty, RawValue};

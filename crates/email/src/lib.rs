/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! RFC-822 framing and unframing of vCard bodies. This is deliberately
//! narrow: the full `email` crate's thread/search/submission machinery has
//! no counterpart here, so only the message-building seam survives.

pub mod message;

pub use message::{build_vcard_message, extract_vcard_body, VCardMessage};

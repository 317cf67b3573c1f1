/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Small helpers shared across the mailbox lister and the contact/group
//! get/set handlers: building the `From` address and `x-href` URL (§6),
//! stamping `REV` (§4.9), and recovering an address-book id from a store
//! mailbox name.

use common::{Backend, Server};
use vcard::RawCard;

/// `<user>[@<domain>]`, for the `From` header of a staged vCard message and
/// for the `x-href` URL. Domain is elided when the userid already carries
/// one, per §6.
pub fn account_email<B: Backend>(server: &Server<B>, account: &str) -> String {
    if account.contains('@') {
        account.to_string()
    } else if let Some(domain) = &server.config().default_domain {
        format!("{account}@{domain}")
    } else {
        account.to_string()
    }
}

/// `/dav/addressbooks/user/<user>[@<domain>]/<abook>/<resource>`.
pub fn build_href<B: Backend>(server: &Server<B>, account: &str, addressbook_id: &str, resource: &str) -> String {
    format!(
        "/dav/addressbooks/user/{}/{addressbook_id}/{resource}",
        account_email(server, account)
    )
}

/// The tail of a store mailbox name (`user/<acct>/#addressbooks/<abook>`)
/// is the address-book id; the store owns the rest of the namespace
/// encoding, so this is the one place that assumes it has no internal `/`.
pub fn addressbook_id_from_mailbox(mailbox: &str) -> String {
    mailbox.rsplit('/').next().unwrap_or(mailbox).to_string()
}

/// Stamp `REV` with the current ISO-8601 UTC timestamp, replacing any
/// previous value, per §4.9.
pub fn stamp_rev(card: &mut RawCard) {
    card.remove_all("REV");
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    card.push(vcard::RawProperty::text("REV", now));
}

/// Whether `field` should be emitted under a `properties` restriction;
/// `None` (no restriction given) always wants everything.
pub fn wants(properties: Option<&[String]>, field: &str) -> bool {
    properties.map_or(true, |p| p.iter().any(|f| f == field))
}

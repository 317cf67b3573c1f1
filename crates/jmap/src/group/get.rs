/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! `getContactGroups` (§4.5). Same need-set shape as `contact::get`; groups
//! have no `properties` restriction and carry an `x-href` the contact
//! mapper doesn't need, built here since only the executor knows the
//! account/DAV namespace.

use crate::util::build_href;
use ahash::AHashSet;
use common::{AccessToken, Backend, Server};
use jmap_proto::{Idmap, Response};
use serde_json::{json, Value};
use store::{CardDavIndex, MailStore};
use types::{Kind, State};

pub async fn handle<B: Backend>(
    server: &Server<B>,
    access_token: &AccessToken,
    args: &Value,
    tag: &str,
    state: State,
    idmap: &Idmap,
    responses: &mut Vec<Response>,
) -> trc::Result<()> {
    let account = access_token.account_id.as_str();
    let addressbook_id = args
        .get("addressbookId")
        .and_then(Value::as_str)
        .unwrap_or("Default")
        .to_string();
    let mailbox = server.store().addressbook_mailbox(account, &addressbook_id);

    let requested_ids: Option<Vec<String>> = args.get("ids").and_then(Value::as_array).map(|ids| {
        ids.iter()
            .filter_map(Value::as_str)
            .map(|id| idmap.resolve(id))
            .collect()
    });

    let wanted: AHashSet<String> = requested_ids.iter().flatten().cloned().collect();
    let mut seen: AHashSet<String> = AHashSet::default();

    let cards = server.store().get_cards(account, &mailbox, Kind::Group).await?;
    let mut list = Vec::with_capacity(cards.len());
    for card in cards {
        if requested_ids.is_some() && !wanted.contains(&card.uid) {
            continue;
        }
        seen.insert(card.uid.clone());

        let record = server.store().fetch(account, &card.mailbox, card.imap_uid).await?;
        let Ok(body) = email::extract_vcard_body(&record.rfc822) else {
            continue;
        };
        let Ok(raw) = vcard::RawCard::parse(&body) else {
            continue;
        };

        let href = build_href(server, account, &addressbook_id, &card.resource);
        list.push(vcard::group::to_jmap(&raw, &card.uid, &addressbook_id, &href));
    }

    let not_found = requested_ids.map(|ids| ids.into_iter().filter(|id| !seen.contains(id)).collect::<Vec<_>>());

    responses.push(Response::new(
        "contactGroups",
        json!({
            "accountId": account,
            "state": state,
            "list": list,
            "notFound": not_found,
        }),
        tag.to_string(),
    ));
    Ok(())
}

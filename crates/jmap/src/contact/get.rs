/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! `getContacts` (§4.5). The need-set the source tracks with sentinel
//! pointer values is two plain `AHashSet`s here (§9's redesign note):
//! `wanted` holds the id filter (when one was given) and `seen` is filled
//! in as cards are matched against it, so `notFound` falls out as a set
//! difference with no uninitialized-table class of bug to worry about.

use crate::util::wants;
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
    let properties: Option<Vec<String>> = args
        .get("properties")
        .and_then(Value::as_array)
        .map(|props| props.iter().filter_map(Value::as_str).map(String::from).collect());

    let wanted: AHashSet<String> = requested_ids.iter().flatten().cloned().collect();
    let mut seen: AHashSet<String> = AHashSet::default();

    let cards = server.store().get_cards(account, &mailbox, Kind::Contact).await?;
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

        let mut obj = vcard::contact::to_jmap(&raw, &card.uid, &addressbook_id, properties.as_deref());
        if let Value::Object(map) = &mut obj {
            if wants(properties.as_deref(), "isFlagged") {
                map.insert("isFlagged".into(), json!(record.flagged));
            }
            if wants(properties.as_deref(), "x-importance") {
                map.insert("x-importance".into(), json!(record.importance));
            }
        }
        list.push(obj);
    }

    let not_found = requested_ids.map(|ids| ids.into_iter().filter(|id| !seen.contains(id)).collect::<Vec<_>>());

    responses.push(Response::new(
        "contacts",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::set;
    use common::AccessToken;
    use store::memory::MemoryBackend;
    use utils::Config;

    async fn seeded() -> (Server<MemoryBackend>, AccessToken, String) {
        let server = Server::new(Config::default(), MemoryBackend::new("#addressbooks"));
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"create": {"c1": {"firstName": "Ada", "lastName": "Lovelace"}}});
        set::handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let id = responses[0].payload["created"]["c1"]["id"].as_str().unwrap().to_string();
        (server, token, id)
    }

    #[tokio::test]
    async fn get_by_id_returns_the_contact() {
        let (server, token, id) = seeded().await;
        let idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"ids": [id.clone()]});
        handle(&server, &token, &args, "t2", State::from(1), &idmap, &mut responses)
            .await
            .unwrap();
        let list = responses[0].payload["list"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], json!(id));
        assert_eq!(list[0]["firstName"], json!("Ada"));
        assert_eq!(list[0]["notFound"], Value::Null);
    }

    #[tokio::test]
    async fn unmatched_id_is_reported_not_found() {
        let (server, token, _id) = seeded().await;
        let idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"ids": ["00000000-0000-0000-0000-000000000000"]});
        handle(&server, &token, &args, "t2", State::from(1), &idmap, &mut responses)
            .await
            .unwrap();
        let payload = &responses[0].payload;
        assert_eq!(payload["list"].as_array().unwrap().len(), 0);
        assert_eq!(
            payload["notFound"],
            json!(["00000000-0000-0000-0000-000000000000"])
        );
    }

    #[tokio::test]
    async fn properties_filter_restricts_fields() {
        let (server, token, id) = seeded().await;
        let idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"ids": [id.clone()], "properties": ["firstName"]});
        handle(&server, &token, &args, "t2", State::from(1), &idmap, &mut responses)
            .await
            .unwrap();
        let contact = &responses[0].payload["list"][0];
        assert_eq!(contact["firstName"], json!("Ada"));
        assert!(contact.get("lastName").is_none());
        assert_eq!(contact["id"], json!(id));
    }
}

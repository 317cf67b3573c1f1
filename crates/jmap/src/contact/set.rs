/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! `setContacts` (§4.7). `create`/`update`/`destroy` run in that order over
//! the request's own key insertion order (`serde_json`'s `preserve_order`
//! feature), so a `create` can be referenced by a same-batch `update` or
//! `destroy` through the idmap.

use crate::util::{account_email, addressbook_id_from_mailbox, stamp_rev};
use common::{AccessToken, Backend, Server};
use email::{build_vcard_message, extract_vcard_body, VCardMessage};
use jmap_proto::{ErrorCode, Idmap, Response};
use serde_json::{json, Map, Value};
use store::{CardDavIndex, CardIndexHint, MailStore};
use types::{Id, Kind, State};
use vcard::MapResult;

pub async fn handle<B: Backend>(
    server: &Server<B>,
    access_token: &AccessToken,
    args: &Value,
    tag: &str,
    state: State,
    idmap: &mut Idmap,
    responses: &mut Vec<Response>,
) -> trc::Result<()> {
    let account = access_token.account_id.as_str();

    if let Some(if_in_state) = args.get("ifInState").and_then(Value::as_str) {
        if if_in_state.parse::<State>().ok() != Some(state) {
            trc::event!(Jmap(trc::JmapEvent::StateMismatch), Tag = tag);
            responses.push(Response::error(ErrorCode::StateMismatch.as_str(), tag.to_string()));
            return Ok(());
        }
    }

    let default_addressbook_id = args
        .get("addressbookId")
        .and_then(Value::as_str)
        .unwrap_or("Default");

    let mut created = Map::new();
    let mut not_created = Map::new();
    let mut updated = Vec::new();
    let mut not_updated = Map::new();
    let mut destroyed = Vec::new();
    let mut not_destroyed = Map::new();

    if let Some(create) = args.get("create").and_then(Value::as_object) {
        for (key, obj) in create {
            match create_one(server, account, default_addressbook_id, obj).await? {
                Ok(id) => {
                    idmap.insert(key.clone(), id);
                    created.insert(key.clone(), json!({"id": id.to_string()}));
                }
                Err(code) => {
                    not_created.insert(key.clone(), json!({"type": code}));
                }
            }
        }
    }

    if let Some(update) = args.get("update").and_then(Value::as_object) {
        for (key, obj) in update {
            let uid = idmap.resolve(key);
            match update_one(server, account, &uid, obj).await? {
                Ok(()) => updated.push(json!(uid)),
                Err(code) => {
                    not_updated.insert(uid, json!({"type": code}));
                }
            }
        }
    }

    if let Some(destroy) = args.get("destroy").and_then(Value::as_array) {
        for (index, entry) in destroy.iter().enumerate() {
            let Some(raw_uid) = entry.as_str() else {
                not_destroyed.insert(format!("#{index}"), json!({"type": ErrorCode::InvalidArguments.as_str()}));
                continue;
            };
            let uid = idmap.resolve(raw_uid);
            match destroy_one(server, account, &uid).await? {
                Ok(()) => destroyed.push(json!(uid)),
                Err(code) => {
                    not_destroyed.insert(uid, json!({"type": code}));
                }
            }
        }
    }

    let inbox = server.store().inbox_mailbox(account);
    let new_state = State::from(server.store().modseq(account, &inbox).await?);

    let mut payload = Map::new();
    payload.insert("accountId".into(), json!(account));
    payload.insert("oldState".into(), json!(state));
    payload.insert("newState".into(), json!(new_state));
    if !created.is_empty() {
        payload.insert("created".into(), Value::Object(created));
    }
    if !not_created.is_empty() {
        payload.insert("notCreated".into(), Value::Object(not_created));
    }
    if !updated.is_empty() {
        payload.insert("updated".into(), Value::Array(updated));
    }
    if !not_updated.is_empty() {
        payload.insert("notUpdated".into(), Value::Object(not_updated));
    }
    if !destroyed.is_empty() {
        payload.insert("destroyed".into(), Value::Array(destroyed));
    }
    if !not_destroyed.is_empty() {
        payload.insert("notDestroyed".into(), Value::Object(not_destroyed));
    }

    responses.push(Response::new("contactsSet", Value::Object(payload), tag.to_string()));
    Ok(())
}

async fn create_one<B: Backend>(
    server: &Server<B>,
    account: &str,
    default_addressbook_id: &str,
    obj: &Value,
) -> trc::Result<Result<Id, &'static str>> {
    let Some(map) = obj.as_object() else {
        return Ok(Err(ErrorCode::InvalidParameters.as_str()));
    };

    let addressbook_id = map
        .get("addressbookId")
        .and_then(Value::as_str)
        .unwrap_or(default_addressbook_id);
    let mailbox = server.store().addressbook_mailbox(account, addressbook_id);

    let id = Id::new();
    let uid = id.to_string();
    let mut card = vcard::contact::new_card(&uid);
    match vcard::contact::apply_jmap(&mut card, map) {
        MapResult::Err(code) => return Ok(Err(code)),
        MapResult::Ok(c) => card = c,
        MapResult::NoContent => {}
    }
    vcard::contact::ensure_fn(&mut card);
    stamp_rev(&mut card);

    let fn_name = card.get("FN").and_then(|p| p.value.as_text()).unwrap_or("No Name").to_string();
    let body = card.serialize();
    let meta = VCardMessage {
        uid: &uid,
        fn_name: &fn_name,
        from_address: &account_email(server, account),
        hostname: &server.config().hostname,
        resource_name: None,
    };
    let rfc822 = build_vcard_message(&meta, &body)?;
    let appended = server
        .store()
        .append(account, &mailbox, &rfc822, None, Some(CardIndexHint { uid: &uid, kind: Kind::Contact }))
        .await?;

    if let Some(flagged) = map.get("isFlagged").and_then(Value::as_bool) {
        server.store().set_flagged(account, &mailbox, appended.imap_uid, flagged).await?;
    }
    if let Some(importance) = map.get("x-importance") {
        server
            .store()
            .set_importance(account, &mailbox, appended.imap_uid, importance.as_f64())
            .await?;
    }

    Ok(Ok(id))
}

async fn update_one<B: Backend>(server: &Server<B>, account: &str, uid: &str, obj: &Value) -> trc::Result<Result<(), &'static str>> {
    let Some(map) = obj.as_object() else {
        return Ok(Err(ErrorCode::InvalidParameters.as_str()));
    };

    let Some(existing) = server.store().lookup_uid(account, uid).await? else {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    };
    if !existing.alive || existing.kind != Kind::Contact {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    }

    let existing_addressbook_id = addressbook_id_from_mailbox(&existing.mailbox);
    let target_mailbox = map
        .get("addressbookId")
        .and_then(Value::as_str)
        .filter(|id| *id != existing_addressbook_id)
        .map(|id| server.store().addressbook_mailbox(account, id));

    let record = server.store().fetch(account, &existing.mailbox, existing.imap_uid).await?;
    let Ok(body) = extract_vcard_body(&record.rfc822) else {
        return Ok(Err(ErrorCode::ParseError.as_str()));
    };
    let Ok(mut card) = vcard::RawCard::parse(&body) else {
        return Ok(Err(ErrorCode::ParseError.as_str()));
    };

    match vcard::contact::apply_jmap(&mut card, map) {
        MapResult::Err(code) => return Ok(Err(code)),
        MapResult::NoContent if target_mailbox.is_none() => {
            if let Some(flagged) = map.get("isFlagged").and_then(Value::as_bool) {
                server.store().set_flagged(account, &existing.mailbox, existing.imap_uid, flagged).await?;
            }
            if let Some(importance) = map.get("x-importance") {
                server
                    .store()
                    .set_importance(account, &existing.mailbox, existing.imap_uid, importance.as_f64())
                    .await?;
            }
            return Ok(Ok(()));
        }
        MapResult::NoContent => {
            // A move with no body diff still has to go through the full
            // re-append/expunge path so the record lands in the new mailbox.
        }
        MapResult::Ok(c) => card = c,
    }

    vcard::contact::ensure_fn(&mut card);
    stamp_rev(&mut card);

    let fn_name = card.get("FN").and_then(|p| p.value.as_text()).unwrap_or("No Name").to_string();
    let body = card.serialize();
    let dest_mailbox = target_mailbox.clone().unwrap_or_else(|| existing.mailbox.clone());
    let meta = VCardMessage {
        uid,
        fn_name: &fn_name,
        from_address: &account_email(server, account),
        hostname: &server.config().hostname,
        resource_name: Some(&existing.resource),
    };
    let rfc822 = build_vcard_message(&meta, &body)?;
    let appended = server
        .store()
        .append(account, &dest_mailbox, &rfc822, Some(&existing.resource), Some(CardIndexHint { uid, kind: Kind::Contact }))
        .await?;

    if let Some(flagged) = map.get("isFlagged").and_then(Value::as_bool) {
        server.store().set_flagged(account, &dest_mailbox, appended.imap_uid, flagged).await?;
    }
    if let Some(importance) = map.get("x-importance") {
        server
            .store()
            .set_importance(account, &dest_mailbox, appended.imap_uid, importance.as_f64())
            .await?;
    }

    let unbind = target_mailbox.is_none();
    server.store().expunge(account, &existing.mailbox, existing.imap_uid, unbind).await?;

    Ok(Ok(()))
}

async fn destroy_one<B: Backend>(server: &Server<B>, account: &str, uid: &str) -> trc::Result<Result<(), &'static str>> {
    let Some(existing) = server.store().lookup_uid(account, uid).await? else {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    };
    if !existing.alive || existing.kind != Kind::Contact {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    }
    server.store().expunge(account, &existing.mailbox, existing.imap_uid, false).await?;
    Ok(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::memory::MemoryBackend;
    use utils::Config;

    fn test_server() -> Server<MemoryBackend> {
        Server::new(Config::default(), MemoryBackend::new("#addressbooks"))
    }

    #[tokio::test]
    async fn create_then_destroy() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();

        let args = json!({"create": {"c1": {"firstName": "Ada", "lastName": "Lovelace"}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let created = &responses[0].payload["created"]["c1"];
        let id = created["id"].as_str().unwrap().to_string();
        responses.clear();

        let args = json!({"destroy": [id.clone()]});
        handle(&server, &token, &args, "t2", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let destroyed = responses[0].payload["destroyed"].as_array().unwrap();
        assert_eq!(destroyed[0], json!(id));
    }

    #[tokio::test]
    async fn state_mismatch_is_embedded_and_aborts() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"ifInState": "999", "create": {"c1": {"firstName": "X"}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].payload["type"], json!("stateMismatch"));
    }

    #[tokio::test]
    async fn flag_only_update_takes_no_content_fast_path() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"create": {"c1": {"firstName": "Ada"}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let id = responses[0].payload["created"]["c1"]["id"].as_str().unwrap().to_string();
        responses.clear();

        let args = json!({"update": {id.clone(): {"isFlagged": true}}});
        handle(&server, &token, &args, "t2", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert_eq!(responses[0].payload["updated"][0], json!(id));
    }

    #[tokio::test]
    async fn move_across_addressbooks_preserves_uid() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"create": {"c1": {"firstName": "Ada"}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let id = responses[0].payload["created"]["c1"]["id"].as_str().unwrap().to_string();
        responses.clear();

        let args = json!({"update": {id.clone(): {"addressbookId": "Work"}}});
        handle(&server, &token, &args, "t2", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert_eq!(responses[0].payload["updated"][0], json!(id));

        let moved = server.store().lookup_uid("alice", &id).await.unwrap().unwrap();
        assert!(moved.mailbox.ends_with("Work"));
    }

    #[tokio::test]
    async fn unknown_key_is_not_created() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"create": {"c1": {"bogus": 1}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert_eq!(responses[0].payload["notCreated"]["c1"]["type"], json!("invalidParameters"));
    }
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! `setContactGroups` (§4.7). `contactIds` entries are resolved through the
//! idmap before validation, since a group created later in the same batch
//! routinely references a contact created earlier in it by creation key.

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
            match create_one(server, account, default_addressbook_id, obj, idmap).await? {
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
            match update_one(server, account, &uid, obj, idmap).await? {
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

    responses.push(Response::new("contactGroupsSet", Value::Object(payload), tag.to_string()));
    Ok(())
}

/// Rewrite every `contactIds` entry through the idmap, leaving everything
/// else untouched. `otherAccountContactIds` is not rewritten: its members
/// live in a different account's id space, outside this batch's idmap.
fn resolve_contact_ids(map: &Map<String, Value>, idmap: &Idmap) -> Map<String, Value> {
    let mut out = map.clone();
    if let Some(ids) = out.get("contactIds").and_then(Value::as_array).cloned() {
        let resolved: Vec<Value> = ids
            .iter()
            .map(|v| match v.as_str() {
                Some(s) => json!(idmap.resolve(s)),
                None => v.clone(),
            })
            .collect();
        out.insert("contactIds".into(), json!(resolved));
    }
    out
}

async fn validate_contact_ids<B: Backend>(server: &Server<B>, account: &str, map: &Map<String, Value>) -> trc::Result<Result<(), &'static str>> {
    let Some(ids) = map.get("contactIds").and_then(Value::as_array) else {
        return Ok(Ok(()));
    };
    for id in ids {
        let Some(uid) = id.as_str() else {
            return Ok(Err(ErrorCode::InvalidContactId.as_str()));
        };
        match server.store().lookup_uid(account, uid).await? {
            Some(meta) if meta.alive && meta.kind == Kind::Contact => {}
            _ => return Ok(Err(ErrorCode::InvalidContactId.as_str())),
        }
    }
    Ok(Ok(()))
}

async fn create_one<B: Backend>(
    server: &Server<B>,
    account: &str,
    default_addressbook_id: &str,
    obj: &Value,
    idmap: &Idmap,
) -> trc::Result<Result<Id, &'static str>> {
    let Some(map) = obj.as_object() else {
        return Ok(Err(ErrorCode::InvalidParameters.as_str()));
    };
    if !map.contains_key("name") {
        return Ok(Err(ErrorCode::MissingParameters.as_str()));
    }

    let resolved = resolve_contact_ids(map, idmap);
    if let Err(code) = validate_contact_ids(server, account, &resolved).await? {
        return Ok(Err(code));
    }

    let addressbook_id = resolved.get("addressbookId").and_then(Value::as_str).unwrap_or(default_addressbook_id);
    let mailbox = server.store().addressbook_mailbox(account, addressbook_id);

    let id = Id::new();
    let uid = id.to_string();
    let mut card = vcard::group::new_group(&uid);
    match vcard::group::apply_jmap(&mut card, &resolved) {
        MapResult::Err(code) => return Ok(Err(code)),
        MapResult::Ok(c) => card = c,
        MapResult::NoContent => {}
    }
    stamp_rev(&mut card);

    let fn_name = card.get("FN").and_then(|p| p.value.as_text()).unwrap_or_default().to_string();
    let body = card.serialize();
    let meta = VCardMessage {
        uid: &uid,
        fn_name: &fn_name,
        from_address: &account_email(server, account),
        hostname: &server.config().hostname,
        resource_name: None,
    };
    let rfc822 = build_vcard_message(&meta, &body)?;
    server
        .store()
        .append(account, &mailbox, &rfc822, None, Some(CardIndexHint { uid: &uid, kind: Kind::Group }))
        .await?;

    Ok(Ok(id))
}

async fn update_one<B: Backend>(server: &Server<B>, account: &str, uid: &str, obj: &Value, idmap: &Idmap) -> trc::Result<Result<(), &'static str>> {
    let Some(map) = obj.as_object() else {
        return Ok(Err(ErrorCode::InvalidParameters.as_str()));
    };

    let Some(existing) = server.store().lookup_uid(account, uid).await? else {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    };
    if !existing.alive || existing.kind != Kind::Group {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    }

    let resolved = resolve_contact_ids(map, idmap);
    if let Err(code) = validate_contact_ids(server, account, &resolved).await? {
        return Ok(Err(code));
    }

    let existing_addressbook_id = addressbook_id_from_mailbox(&existing.mailbox);
    let target_mailbox = resolved
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

    match vcard::group::apply_jmap(&mut card, &resolved) {
        MapResult::Err(code) => return Ok(Err(code)),
        MapResult::Ok(c) => card = c,
        MapResult::NoContent => {}
    }
    stamp_rev(&mut card);

    let fn_name = card.get("FN").and_then(|p| p.value.as_text()).unwrap_or_default().to_string();
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
    server
        .store()
        .append(account, &dest_mailbox, &rfc822, Some(&existing.resource), Some(CardIndexHint { uid, kind: Kind::Group }))
        .await?;

    let unbind = target_mailbox.is_none();
    server.store().expunge(account, &existing.mailbox, existing.imap_uid, unbind).await?;

    Ok(Ok(()))
}

async fn destroy_one<B: Backend>(server: &Server<B>, account: &str, uid: &str) -> trc::Result<Result<(), &'static str>> {
    let Some(existing) = server.store().lookup_uid(account, uid).await? else {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    };
    if !existing.alive || existing.kind != Kind::Group {
        return Ok(Err(ErrorCode::NotFound.as_str()));
    }
    server.store().expunge(account, &existing.mailbox, existing.imap_uid, false).await?;
    Ok(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact;
    use store::memory::MemoryBackend;
    use utils::Config;

    fn test_server() -> Server<MemoryBackend> {
        Server::new(Config::default(), MemoryBackend::new("#addressbooks"))
    }

    #[tokio::test]
    async fn missing_name_is_missing_parameters() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"create": {"g1": {"contactIds": []}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert_eq!(responses[0].payload["notCreated"]["g1"]["type"], json!("missingParameters"));
    }

    #[tokio::test]
    async fn same_batch_contact_reference_resolves() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();

        let args = json!({
            "create": {"c1": {"firstName": "Ada"}},
        });
        contact::set::handle(&server, &token, &args, "t0", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        responses.clear();

        let args = json!({"create": {"g1": {"name": "Friends", "contactIds": ["#c1"]}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert!(responses[0].payload["created"].get("g1").is_some());
    }

    #[tokio::test]
    async fn unresolvable_contact_id_is_invalid() {
        let server = test_server();
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"create": {"g1": {"name": "Friends", "contactIds": ["00000000-0000-0000-0000-000000000000"]}}});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert_eq!(responses[0].payload["notCreated"]["g1"]["type"], json!("invalidContactId"));
    }
}

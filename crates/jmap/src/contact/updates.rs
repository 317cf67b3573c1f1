/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! `getContactUpdates` (§4.6). Partitions the CardDAV view's changed rows
//! into `changed`/`removed` by their `alive` flag, then strips any UID that
//! shows up in both — a move looks like a remove-and-create at the storage
//! layer, but the client only wants one "changed" entry for it.

use ahash::AHashSet;
use common::{AccessToken, Backend, Server};
use jmap_proto::{ErrorCode, Idmap, Response};
use serde_json::{json, Value};
use store::CardDavIndex;
use types::{Kind, State};

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

    let Some(since_state) = args
        .get("sinceState")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u64>().ok())
    else {
        responses.push(Response::error(ErrorCode::InvalidArguments.as_str(), tag.to_string()));
        return Ok(());
    };

    let rows = server.store().get_updates(account, since_state, Kind::Contact).await?;

    let mut changed: AHashSet<String> = AHashSet::default();
    let mut removed: AHashSet<String> = AHashSet::default();
    for row in rows {
        if row.alive {
            changed.insert(row.uid);
        } else {
            removed.insert(row.uid);
        }
    }
    removed.retain(|uid| !changed.contains(uid));

    let changed: Vec<String> = changed.into_iter().collect();
    let removed: Vec<String> = removed.into_iter().collect();

    responses.push(Response::new(
        "contactUpdates",
        json!({
            "accountId": account,
            "oldState": since_state.to_string(),
            "newState": state,
            "changed": changed,
            "removed": removed,
        }),
        tag.to_string(),
    ));

    let fetch_requested = args.get("fetchContacts").and_then(Value::as_bool).unwrap_or(false);
    if fetch_requested && !changed.is_empty() {
        let mut nested_args = serde_json::Map::new();
        nested_args.insert("ids".into(), json!(changed));
        if let Some(properties) = args.get("fetchContactProperties") {
            nested_args.insert("properties".into(), properties.clone());
        }
        if let Some(addressbook_id) = args.get("addressbookId") {
            nested_args.insert("addressbookId".into(), addressbook_id.clone());
        }
        crate::contact::get::handle(
            server,
            access_token,
            &Value::Object(nested_args),
            tag,
            state,
            idmap,
            responses,
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::set;
    use common::AccessToken;
    use store::memory::MemoryBackend;
    use utils::Config;

    #[tokio::test]
    async fn since_equals_new_is_empty() {
        let server = Server::new(Config::default(), MemoryBackend::new("#addressbooks"));
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"sinceState": "0"});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let payload = &responses[0].payload;
        assert_eq!(payload["changed"].as_array().unwrap().len(), 0);
        assert_eq!(payload["removed"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn invalid_since_state_is_embedded_error() {
        let server = Server::new(Config::default(), MemoryBackend::new("#addressbooks"));
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();
        let args = json!({"sinceState": "not-a-number"});
        handle(&server, &token, &args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        assert_eq!(responses[0].name, "error");
    }

    #[tokio::test]
    async fn spurious_delete_is_stripped() {
        let server = Server::new(Config::default(), MemoryBackend::new("#addressbooks"));
        let token = AccessToken::new("alice", "alice");
        let mut idmap = Idmap::new();
        let mut responses = Vec::new();

        let create_args = json!({"create": {"c1": {"firstName": "Ada"}}});
        set::handle(&server, &token, &create_args, "t0", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let id = responses[0].payload["created"]["c1"]["id"].as_str().unwrap().to_string();
        responses.clear();

        let move_args = json!({"update": {id.clone(): {"addressbookId": "Work"}}});
        set::handle(&server, &token, &move_args, "t1", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        responses.clear();

        let updates_args = json!({"sinceState": "0"});
        handle(&server, &token, &updates_args, "t2", State::from(0), &mut idmap, &mut responses)
            .await
            .unwrap();
        let payload = &responses[0].payload;
        let changed = payload["changed"].as_array().unwrap();
        let removed = payload["removed"].as_array().unwrap();
        assert!(changed.iter().any(|v| v == &json!(id)));
        assert!(!removed.iter().any(|v| v == &json!(id)));
    }
}

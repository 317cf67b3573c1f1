/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! `getMailboxes` (§4.3). ACL filtering is the store's job (documented on
//! [`store::MailStore::list_mailboxes`]); this handler only reshapes the
//! returned summaries into the wire record.

use common::{AccessToken, Backend, Server};
use jmap_proto::Response;
use serde_json::{json, Value};
use store::MailStore;
use types::State;

pub async fn get_mailboxes<B: Backend>(
    server: &Server<B>,
    access_token: &AccessToken,
    _args: &Value,
    tag: &str,
    state: State,
    responses: &mut Vec<Response>,
) -> trc::Result<()> {
    let account = access_token.account_id.as_str();
    let list: Vec<Value> = server
        .store()
        .list_mailboxes(account)
        .await?
        .into_iter()
        .map(|m| {
            json!({
                "id": m.id,
                "name": m.name,
                "parentId": m.parent_id,
                "role": m.role,
                "mayAddMessages": m.may_add_messages,
                "mayRemoveMessages": m.may_remove_messages,
                "mayCreateChild": m.may_create_child,
                "mayDeleteMailbox": m.may_delete_mailbox,
                "totalMessages": m.total_messages,
                "unreadMessages": m.unread_messages,
            })
        })
        .collect();

    responses.push(Response::new(
        "mailboxes",
        json!({
            "accountId": account,
            "state": state,
            "list": list,
            "notFound": Value::Null,
        }),
        tag.to_string(),
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AccessToken;
    use store::memory::MemoryBackend;
    use utils::Config;

    #[tokio::test]
    async fn lists_the_seeded_inbox() {
        let server = Server::new(Config::default(), MemoryBackend::new("#addressbooks"));
        let token = AccessToken::new("alice", "alice");
        let mut responses = Vec::new();
        get_mailboxes(&server, &token, &Value::Null, "t1", State::from(0), &mut responses)
            .await
            .unwrap();
        assert_eq!(responses.len(), 1);
        let payload = &responses[0].payload;
        assert_eq!(payload["list"].as_array().unwrap().len(), 1);
        assert_eq!(payload["list"][0]["role"], json!("inbox"));
    }
}

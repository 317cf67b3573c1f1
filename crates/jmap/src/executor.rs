/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! The batch executor (§4.1): parses the request body, takes the inbox
//! intent-write lock, snapshots a state token per invocation, walks the
//! registry dispatch in order, and serializes the response array. A fatal
//! handler error aborts the whole batch; per-invocation errors are
//! embedded and execution continues.

use crate::{contact, group, mailbox};
use common::{AccessToken, Backend, Server};
use jmap_proto::{parse_batch, serialize_batch, BatchError, ErrorCode, Idmap, Invocation, Response};
use serde_json::Value;
use store::MailStore;
use types::State;

/// What the HTTP layer does with a finished batch. `Ok` carries the
/// serialized response array; the other variants map directly to the
/// status codes in §6/§7.
pub enum BatchOutcome {
    Ok(Value),
    BadRequest,
    UnsupportedMediaType,
    StorageError,
}

/// Execute one request batch against `server` as `access_token`'s account.
/// `content_type` is the transport's `Content-Type` header value, checked
/// here since media-type rejection (415) is part of this contract even
/// though header parsing itself lives in the HTTP layer.
pub async fn execute_batch<B: Backend>(
    server: &Server<B>,
    access_token: &AccessToken,
    content_type: Option<&str>,
    body: &[u8],
) -> BatchOutcome {
    if !content_type
        .map(|c| c.eq_ignore_ascii_case("application/json") || c.starts_with("application/json;"))
        .unwrap_or(false)
    {
        return BatchOutcome::UnsupportedMediaType;
    }
    if body.is_empty() {
        return BatchOutcome::BadRequest;
    }
    let invocations = match parse_batch(body) {
        Ok(invocations) => invocations,
        Err(BatchError::NotJson | BatchError::NotArray) => return BatchOutcome::BadRequest,
    };

    let account = access_token.account_id.as_str();
    let inbox = server.store().inbox_mailbox(account);

    let guard = match server.store().lock_inbox(account).await {
        Ok(guard) => guard,
        Err(err) => {
            trc::error!(err);
            return BatchOutcome::StorageError;
        }
    };

    let mut idmap = Idmap::new();
    let mut responses: Vec<Response> = Vec::with_capacity(invocations.len());

    for Invocation { method, args, tag } in invocations {
        let state = match server.store().modseq(account, &inbox).await {
            Ok(modseq) => State::from(modseq),
            Err(err) => {
                trc::error!(err);
                drop(guard);
                return BatchOutcome::StorageError;
            }
        };

        trc::event!(Jmap(trc::JmapEvent::MethodCall), Method = &method, Tag = &tag);

        let outcome = dispatch(server, access_token, &method, &args, &tag, state, &mut idmap, &mut responses).await;
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                trc::event!(Jmap(trc::JmapEvent::UnknownMethod), Method = &method);
                responses.push(Response::error(ErrorCode::UnknownMethod.as_str(), tag));
            }
            Err(err) => {
                trc::error!(err);
                drop(guard);
                return BatchOutcome::StorageError;
            }
        }
    }

    // Release the inbox lock before serializing to keep the critical
    // section short, per §4.1 step 5.
    drop(guard);

    BatchOutcome::Ok(serialize_batch(&responses))
}

/// The method registry: name → handler. A plain match rather than a
/// generic `HashMap<&str, fn(...)>` table, since handlers are generic over
/// the backend and return `impl Future`, which a function-pointer table
/// can't hold without boxing every call. Returns `Ok(false)` for a name
/// not in the registry so the executor can embed `unknownMethod`.
async fn dispatch<B: Backend>(
    server: &Server<B>,
    access_token: &AccessToken,
    method: &str,
    args: &Value,
    tag: &str,
    state: State,
    idmap: &mut Idmap,
    responses: &mut Vec<Response>,
) -> trc::Result<bool> {
    match method {
        "getMailboxes" => {
            mailbox::get_mailboxes(server, access_token, args, tag, state, responses).await?;
        }
        "getContacts" => {
            contact::get::handle(server, access_token, args, tag, state, idmap, responses).await?;
        }
        "getContactUpdates" => {
            contact::updates::handle(server, access_token, args, tag, state, idmap, responses).await?;
        }
        "setContacts" => {
            contact::set::handle(server, access_token, args, tag, state, idmap, responses).await?;
        }
        "getContactGroups" => {
            group::get::handle(server, access_token, args, tag, state, idmap, responses).await?;
        }
        "getContactGroupUpdates" => {
            group::updates::handle(server, access_token, args, tag, state, idmap, responses).await?;
        }
        "setContactGroups" => {
            group::set::handle(server, access_token, args, tag, state, idmap, responses).await?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

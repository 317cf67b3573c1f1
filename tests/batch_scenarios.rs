/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! End-to-end batch executor scenarios, each one driving
//! [`jmap::execute_batch`] against an in-memory store double the way an
//! HTTP transport shim would: raw JSON body bytes in, a serialized
//! response array out.

use common::{AccessToken, Server};
use jmap::BatchOutcome;
use serde_json::{json, Value};
use store::memory::MemoryBackend;
use utils::Config;

fn new_server() -> Server<MemoryBackend> {
    Server::new(Config::default(), MemoryBackend::new("#addressbooks"))
}

async fn run(server: &Server<MemoryBackend>, token: &AccessToken, batch: Value) -> Value {
    let body = serde_json::to_vec(&batch).unwrap();
    match jmap::execute_batch(server, token, Some("application/json"), &body).await {
        BatchOutcome::Ok(value) => value,
        other => panic!("expected a successful batch outcome, got an aborted one: {}", describe(other)),
    }
}

fn describe(outcome: BatchOutcome) -> &'static str {
    match outcome {
        BatchOutcome::Ok(_) => "ok",
        BatchOutcome::BadRequest => "bad request",
        BatchOutcome::UnsupportedMediaType => "unsupported media type",
        BatchOutcome::StorageError => "storage error",
    }
}

#[tokio::test]
async fn unknown_method() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let response = run(&server, &token, json!([["nope", {}, "t1"]])).await;
    assert_eq!(response, json!([["error", {"type": "unknownMethod"}, "t1"]]));
}

#[tokio::test]
async fn state_mismatch() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let response = run(&server, &token, json!([["setContacts", {"ifInState": "41"}, "t1"]])).await;
    assert_eq!(response[0][0], json!("error"));
    assert_eq!(response[0][1]["type"], json!("stateMismatch"));
    assert_eq!(response[0][2], json!("t1"));
}

#[tokio::test]
async fn create_then_reference_in_the_same_batch() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let response = run(
        &server,
        &token,
        json!([
            ["setContactGroups", {"create": {"g1": {"name": "Friends"}}}, "a"],
            ["getContactGroups", {"ids": ["g1"]}, "b"],
        ]),
    )
    .await;

    let created_id = response[0][1]["created"]["g1"]["id"].as_str().unwrap().to_string();
    assert!(!created_id.is_empty());

    let list = response[1][1]["list"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], json!(created_id));
    assert_eq!(list[0]["name"], json!("Friends"));
    assert_eq!(list[0]["contactIds"], json!([]));
}

#[tokio::test]
async fn partial_birthday_round_trips() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let response = run(
        &server,
        &token,
        json!([
            ["setContacts", {"create": {"c1": {"birthday": "0000-03-15"}}}, "a"],
            ["getContacts", {}, "b"],
        ]),
    )
    .await;

    assert!(response[0][1]["created"]["c1"]["id"].is_string());
    let list = response[1][1]["list"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["birthday"], json!("0000-03-15"));
}

#[tokio::test]
async fn move_across_address_books_preserves_id_and_unbinds() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");

    let response = run(&server, &token, json!([["setContacts", {"create": {"c1": {"firstName": "Ada"}}}, "a"]])).await;
    let id = response[0][1]["created"]["c1"]["id"].as_str().unwrap().to_string();

    let response = run(
        &server,
        &token,
        json!([["setContacts", {"update": {id.clone(): {"addressbookId": "Work"}}}, "a"]]),
    )
    .await;
    assert_eq!(response[0][1]["updated"][0], json!(id));

    let response = run(&server, &token, json!([["getContacts", {"addressbookId": "Default", "ids": [id.clone()]}, "a"]])).await;
    assert_eq!(response[0][1]["list"].as_array().unwrap().len(), 0);
    assert_eq!(response[0][1]["notFound"], json!([id.clone()]));

    let response = run(&server, &token, json!([["getContacts", {"addressbookId": "Work", "ids": [id.clone()]}, "a"]])).await;
    let list = response[0][1]["list"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], json!(id));
}

#[tokio::test]
async fn spurious_delete_strip_across_a_move() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");

    let response = run(&server, &token, json!([["setContacts", {"create": {"c1": {"firstName": "Ada"}}}, "a"]])).await;
    let id = response[0][1]["created"]["c1"]["id"].as_str().unwrap().to_string();

    run(
        &server,
        &token,
        json!([["setContacts", {"update": {id.clone(): {"addressbookId": "Work"}}}, "a"]]),
    )
    .await;

    let response = run(&server, &token, json!([["getContactUpdates", {"sinceState": "0"}, "a"]])).await;
    let changed = response[0][1]["changed"].as_array().unwrap();
    let removed = response[0][1]["removed"].as_array().unwrap();
    assert!(changed.iter().any(|v| v == &json!(id)));
    assert!(!removed.iter().any(|v| v == &json!(id)));
}

#[tokio::test]
async fn since_state_equal_to_new_state_is_empty() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let response = run(&server, &token, json!([["getContacts", {}, "a"]])).await;
    let state = response[0][1]["state"].as_str().unwrap().to_string();

    let response = run(&server, &token, json!([["getContactUpdates", {"sinceState": state}, "a"]])).await;
    assert_eq!(response[0][1]["changed"].as_array().unwrap().len(), 0);
    assert_eq!(response[0][1]["removed"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn set_response_new_state_reflects_the_mutation() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let response = run(&server, &token, json!([["setContacts", {"create": {"c1": {"firstName": "Ada"}}}, "a"]])).await;
    let old_state = response[0][1]["oldState"].as_str().unwrap();
    let new_state = response[0][1]["newState"].as_str().unwrap();
    assert_ne!(old_state, new_state);
}

#[tokio::test]
async fn wrong_media_type_is_rejected_before_parsing() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let body = serde_json::to_vec(&json!([])).unwrap();
    let outcome = jmap::execute_batch(&server, &token, Some("text/plain"), &body).await;
    assert!(matches!(outcome, BatchOutcome::UnsupportedMediaType));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let server = new_server();
    let token = AccessToken::new("alice", "alice");
    let outcome = jmap::execute_batch(&server, &token, Some("application/json"), b"{not json").await;
    assert!(matches!(outcome, BatchOutcome::BadRequest));
}

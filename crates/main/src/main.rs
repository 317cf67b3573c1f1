/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! A minimal demo binary: wires an in-memory [`store::memory::MemoryBackend`]
//! behind a [`common::Server`] and runs a couple of JMAP batches through
//! [`jmap::execute_batch`], printing the response bodies. There is no HTTP
//! listener here — the batch executor's entry point takes exactly the
//! inputs an HTTP layer would hand it, so wiring one up is a transport shim
//! this binary deliberately leaves out.

use common::{AccessToken, Server};
use jmap::BatchOutcome;
use serde_json::json;
use store::memory::MemoryBackend;
use utils::Config;

#[tokio::main]
async fn main() {
    common::telemetry::init();

    let server = Server::new(Config::default(), MemoryBackend::new("#addressbooks"));
    let access_token = AccessToken::new("demo@example.com", "demo");

    let create_batch = serde_json::to_vec(&json!([[
        "setContacts",
        {"create": {"c1": {"firstName": "Ada", "lastName": "Lovelace", "emails": [{"value": "ada@example.com"}]}}},
        "c1"
    ]]))
    .expect("batch body serializes");

    match jmap::execute_batch(&server, &access_token, Some("application/json"), &create_batch).await {
        BatchOutcome::Ok(value) => println!("{}", serde_json::to_string_pretty(&value).unwrap()),
        BatchOutcome::BadRequest => eprintln!("bad request"),
        BatchOutcome::UnsupportedMediaType => eprintln!("unsupported media type"),
        BatchOutcome::StorageError => eprintln!("storage error"),
    }

    let list_batch = serde_json::to_vec(&json!([["getContacts", {}, "c2"]])).expect("batch body serializes");
    match jmap::execute_batch(&server, &access_token, Some("application/json"), &list_batch).await {
        BatchOutcome::Ok(value) => println!("{}", serde_json::to_string_pretty(&value).unwrap()),
        BatchOutcome::BadRequest => eprintln!("bad request"),
        BatchOutcome::UnsupportedMediaType => eprintln!("unsupported media type"),
        BatchOutcome::StorageError => eprintln!("storage error"),
    }
}

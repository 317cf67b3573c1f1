/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! The JMAP wire types the batch executor and method handlers share:
//! invocation/response triples over free-form `serde_json::Value` payloads,
//! the batch-scoped creation-key idmap, and the per-invocation error codes.

pub mod error;
pub mod idmap;
pub mod request;
pub mod response;

pub use error::ErrorCode;
pub use idmap::Idmap;
pub use request::{parse_batch, BatchError, Invocation};
pub use response::{serialize_batch, Response};

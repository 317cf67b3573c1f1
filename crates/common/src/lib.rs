/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Shared server context: the `Server` handle every JMAP handler receives,
//! the `AccessToken` identifying the calling principal, and process-wide
//! telemetry setup. A narrow slice of a full mail server's common crate,
//! which also carries directory lookups, TLS listeners, and enterprise
//! licensing that this contacts-only server has no use for.

pub mod auth;
pub mod core;
pub mod telemetry;

pub use auth::AccessToken;
pub use core::{Backend, Server};

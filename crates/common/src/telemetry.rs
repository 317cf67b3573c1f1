/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Process-wide logging init. Since `trc` here is a thin facade over
//! `tracing`, a plain `tracing-subscriber` `fmt` layer is the idiomatic
//! way to wire it up, rather than a custom event collector with
//! subscribers, webhooks, and OpenTelemetry exporters.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber reading `RUST_LOG`, defaulting to
/// `info` when unset. Call once at process start.
pub fn init() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

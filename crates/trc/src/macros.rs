/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// Emits a structured info-level event, in the shape
/// `trc::event!(Jmap(JmapEvent::MethodCall), Id = ..., Elapsed = ...)`.
/// Field names and values are forwarded to `tracing::info!` as-is.
#[macro_export]
macro_rules! event {
    ($kind:ident ($inner:expr), $($field:ident = $value:expr),* $(,)?) => {{
        let _kind = stringify!($kind);
        tracing::info!(kind = _kind, event = $inner.as_str(), $($field = ?$value),*);
    }};
}

/// Emits a structured error-level event from a `trc::Error`.
#[macro_export]
macro_rules! error {
    ($err:expr) => {{
        tracing::error!(error = %$err);
    }};
}

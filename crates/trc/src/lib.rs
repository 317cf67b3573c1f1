/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! A thin structured-logging/error-chain facade — `event!`/`error!`/`Result`
//! call sites built on top of the `tracing` crate rather than a bespoke
//! ring-buffer collector.

mod error;
mod macros;

pub use error::{Cause, Error, JmapEvent};

pub type Result<T> = std::result::Result<T, Error>;

/// Adds `.caused_by(location)` context-chaining to any `Result`.
pub trait AddContext<T> {
    fn caused_by(self, location: &'static str) -> Result<T>;
}

impl<T, E> AddContext<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn caused_by(self, location: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_location(location))
    }
}

#[macro_export]
macro_rules! location {
    () => {
        concat!(file!(), ":", line!())
    };
}

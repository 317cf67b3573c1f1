/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;
use store::{CardDavIndex, MailStore};
use utils::Config;

/// Backing-store requirement shared by the mailbox and CardDAV traits.
/// Generic over the backend rather than a `dyn` object, since both trait
/// methods return `impl Future` (not `dyn`-safe).
pub trait Backend: MailStore + CardDavIndex + Send + Sync + 'static {}
impl<T: MailStore + CardDavIndex + Send + Sync + 'static> Backend for T {}

struct Inner<B> {
    config: Config,
    backend: B,
}

/// Shared, cheaply-cloned handle every JMAP method handler receives.
pub struct Server<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for Server<B> {
    fn clone(&self) -> Self {
        Server {
            inner: self.inner.clone(),
        }
    }
}

impl<B: Backend> Server<B> {
    pub fn new(config: Config, backend: B) -> Self {
        Server {
            inner: Arc::new(Inner { config, backend }),
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    #[inline(always)]
    pub fn store(&self) -> &B {
        &self.inner.backend
    }
}

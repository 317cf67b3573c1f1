/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// The authenticated principal a batch executes as. A narrow slice of a
/// full mail server's `AccessToken` (which also tracks quotas, tenant info,
/// and concurrency limiters), down to the one thing the batch executor
/// actually consults: which account's mailboxes to operate against.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub account_id: String,
    pub name: String,
}

impl AccessToken {
    pub fn new(account_id: impl Into<String>, name: impl Into<String>) -> Self {
        AccessToken {
            account_id: account_id.into(),
            name: name.into(),
        }
    }
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// Whether a card is a contact or a contact group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Contact,
    Group,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Contact => "contact",
            Kind::Group => "group",
        }
    }
}

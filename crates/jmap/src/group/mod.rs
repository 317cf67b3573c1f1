/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! `getContactGroups`/`getContactGroupUpdates`/`setContactGroups` (§4.5–§4.7).

pub mod get;
pub mod set;
pub mod updates;

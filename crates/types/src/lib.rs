/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod id;
pub mod kind;
pub mod state;

pub use id::Id;
pub use kind::Kind;
pub use state::State;

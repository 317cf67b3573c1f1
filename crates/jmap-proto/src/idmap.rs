/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ahash::AHashMap;
use types::Id;

/// Batch-scoped mapping from a client's creation-key to the server UUID
/// minted for it. Built empty at batch start, dropped after the batch's
/// response is flushed.
#[derive(Debug, Default)]
pub struct Idmap(AHashMap<String, Id>);

impl Idmap {
    pub fn new() -> Self {
        Idmap(AHashMap::default())
    }

    pub fn insert(&mut self, key: impl Into<String>, id: Id) {
        self.0.insert(key.into(), id);
    }

    /// Resolve a possibly-`#`-prefixed reference against the idmap. Falls
    /// through to the original string unchanged when there is no mapping —
    /// the caller then treats it as a literal id.
    pub fn resolve(&self, id: &str) -> String {
        let key = id.strip_prefix('#').unwrap_or(id);
        match self.0.get(key) {
            Some(mapped) => mapped.to_string(),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_hash_prefixed_reference() {
        let mut map = Idmap::new();
        let id = Id::new();
        map.insert("g1", id);
        assert_eq!(map.resolve("#g1"), id.to_string());
        assert_eq!(map.resolve("g1"), id.to_string());
    }

    #[test]
    fn unmapped_reference_passes_through() {
        let map = Idmap::new();
        assert_eq!(map.resolve("literal-id"), "literal-id");
    }
}

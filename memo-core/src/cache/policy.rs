// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Eviction policies
//!
//! The five bounded policies plus the two degenerate ones, as a closed
//! tagged enum rather than a trait object: tagged variants give faster
//! dispatch than virtual indirection when the set is closed, and this
//! set of six is fixed.

use crate::key::Key;
use rand::seq::IteratorRandom;
use std::collections::HashMap;

use super::entry::Entry;

/// Which bounded-map discipline a [`super::Cache`] enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Evict the least-recently-used entry.
    Lru,
    /// Evict the least-frequently-used entry.
    Lfu,
    /// Evict the most-recently-used entry.
    Mru,
    /// Evict a uniformly random entry.
    Rr,
    /// Unbounded: never evicts.
    Inf,
    /// `no_cache`: capacity is always zero, every `put` is a pass-through
    /// to the archive (or discarded if there is none).
    No,
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Lru => "lru",
            Policy::Lfu => "lfu",
            Policy::Mru => "mru",
            Policy::Rr => "rr",
            Policy::Inf => "inf",
            Policy::No => "no",
        }
    }

    /// Whether this policy ever evicts. `Inf` holds everything forever;
    /// `No` never holds anything to begin with, so eviction doesn't apply
    /// either (every `put` bypasses the map entirely).
    pub fn evicts(&self) -> bool {
        !matches!(self, Policy::Inf | Policy::No)
    }
}

/// Selects the victim for eviction under `policy` from `map`, applying a
/// deterministic tie-break for each policy. Returns `None` only if `map`
/// is empty (the caller is responsible for not calling this when the
/// cache isn't yet at capacity).
pub fn select_victim(policy: Policy, map: &HashMap<Key, Entry>) -> Option<Key> {
    match policy {
        Policy::Lru => map
            .iter()
            .min_by_key(|(_, e)| (e.last_access, e.inserted_at))
            .map(|(k, _)| k.clone()),
        Policy::Lfu => map
            .iter()
            .min_by_key(|(_, e)| (e.access_count, e.last_access, e.inserted_at))
            .map(|(k, _)| k.clone()),
        Policy::Mru => map
            .iter()
            .max_by_key(|(_, e)| (e.last_access, e.inserted_at))
            .map(|(k, _)| k.clone()),
        Policy::Rr => {
            let mut rng = rand::thread_rng();
            map.keys().choose(&mut rng).cloned()
        }
        Policy::Inf | Policy::No => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn entry(inserted_at: u64, last_access: u64, access_count: u64) -> Entry {
        Entry {
            value: Value::from_bytes(vec![]),
            inserted_at,
            last_access,
            access_count,
        }
    }

    #[test]
    fn lru_picks_smallest_recency_then_insertion_order() {
        let mut map = HashMap::new();
        map.insert(Key::Str("a".into()), entry(0, 10, 1));
        map.insert(Key::Str("b".into()), entry(1, 5, 1));
        map.insert(Key::Str("c".into()), entry(2, 20, 1));
        assert_eq!(select_victim(Policy::Lru, &map), Some(Key::Str("b".into())));
    }

    #[test]
    fn mru_picks_largest_recency_then_latest_insertion() {
        let mut map = HashMap::new();
        map.insert(Key::Str("a".into()), entry(0, 10, 1));
        map.insert(Key::Str("b".into()), entry(1, 20, 1));
        map.insert(Key::Str("c".into()), entry(2, 20, 1));
        // b and c tie on recency 20; MRU tie-break is latest insertion
        // order, so c (inserted_at=2) wins.
        assert_eq!(select_victim(Policy::Mru, &map), Some(Key::Str("c".into())));
    }

    #[test]
    fn lfu_picks_smallest_count_then_lru_tiebreak() {
        let mut map = HashMap::new();
        map.insert(Key::Str("a".into()), entry(0, 100, 5));
        map.insert(Key::Str("b".into()), entry(1, 10, 1));
        map.insert(Key::Str("c".into()), entry(2, 5, 1));
        // b and c tie on count=1; LFU falls back to LRU tiebreak: smaller
        // last_access wins, so c (last_access=5).
        assert_eq!(select_victim(Policy::Lfu, &map), Some(Key::Str("c".into())));
    }

    #[test]
    fn inf_and_no_never_select_a_victim() {
        let mut map = HashMap::new();
        map.insert(Key::Str("a".into()), entry(0, 0, 1));
        assert_eq!(select_victim(Policy::Inf, &map), None);
        assert_eq!(select_victim(Policy::No, &map), None);
    }
}

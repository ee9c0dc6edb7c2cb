// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cache
//!
//! A bounded in-memory mapping `Key → Entry` with a pluggable eviction
//! [`policy::Policy`] and an optional bound [`crate::archive::Archive`].
//! All mutating operations run under a single [`parking_lot::Mutex`]
//! guarding both the map and the policy metadata: the lock is the only
//! thing that makes "size never exceeds capacity" and deterministic
//! eviction ordering hold under concurrent access.
//!
//! Archive I/O never happens while the lock is held: a victim is unlinked
//! from the map first, the lock is dropped, and only then is the evicted
//! `(key, value)` written out. Long-running I/O should never happen
//! inside a critical section guarding in-memory state.

pub mod entry;
pub mod policy;

use crate::archive::Archive;
use crate::error::{MemoError, Result};
use crate::key::Key;
use crate::value::Value;
use entry::Entry;
use parking_lot::Mutex;
use policy::{select_victim, Policy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Which keys a `load`/`dump` call should touch: an explicit key set or
/// every key the archive knows about.
pub enum KeySelector<'a> {
    All,
    Keys(&'a [Key]),
}

/// Observable counters for one cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}

struct Inner {
    map: HashMap<Key, Entry>,
    clock: u64,
    sequence: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// A bounded mapping `Key → Value` with an eviction policy and an optional
/// archive.
pub struct Cache {
    policy: Policy,
    capacity: usize,
    archive: Option<Arc<dyn Archive>>,
    /// An `ArchiveError` on read is treated as a MISS when this is set,
    /// rather than propagated. Defaults to `false`, propagating archive
    /// read failures by default.
    ignore_missing: bool,
    inner: Mutex<Inner>,
    stats: CacheStats,
}

impl Cache {
    /// Builds a new cache. `capacity` is ignored for [`Policy::Inf`]
    /// (unbounded) and MUST be `0` for [`Policy::No`] (pass-through);
    /// any other policy MUST have `capacity >= 1`.
    pub fn new(policy: Policy, capacity: usize, archive: Option<Arc<dyn Archive>>) -> Result<Self> {
        match policy {
            Policy::No if capacity != 0 => {
                return Err(MemoError::capacity("policy `no` requires capacity 0"));
            }
            Policy::Inf => {}
            Policy::No => {}
            _ if capacity == 0 => {
                return Err(MemoError::capacity(format!(
                    "policy `{}` requires a positive capacity",
                    policy.name()
                )));
            }
            _ => {}
        }
        Ok(Self {
            policy,
            capacity,
            archive,
            ignore_missing: false,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                clock: 0,
                sequence: 0,
            }),
            stats: CacheStats::default(),
        })
    }

    /// Sets whether an `ArchiveError` on read is downgraded to a MISS
    /// instead of propagated. Consumed as a builder step before the cache
    /// is shared, e.g. `Cache::new(...)?.with_ignore_missing(true)`.
    pub fn with_ignore_missing(mut self, ignore_missing: bool) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn archive(&self) -> Option<Arc<dyn Archive>> {
        self.archive.clone()
    }

    pub fn ignore_missing(&self) -> bool {
        self.ignore_missing
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// `get(key) → value | MISS`. `MISS` is represented as `None`, a
    /// distinguished sentinel rather than an error. On a hit, policy
    /// metadata (recency/count) is updated, which is why `get` takes
    /// `&self` but still needs the mutex: it is a writer in the
    /// concurrency sense.
    pub fn get(&self, key: &Key) -> Option<Value> {
        if matches!(self.policy, Policy::No) {
            // Pass-through: `no_cache` keeps nothing, so every read goes
            // straight to the archive.
            // `get`'s signature has no room for archive I/O errors; a
            // failing read degrades to a miss.
            let value = self.archive.as_ref().and_then(|a| a.get(key).ok().flatten());
            if value.is_some() {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
            } else {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
            }
            return value;
        }
        let mut inner = self.inner.lock();
        let clock = inner.tick();
        match inner.map.get_mut(key) {
            Some(entry) => {
                entry.touch(clock);
                let value = entry.value.clone();
                drop(inner);
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                drop(inner);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// `put(key, value)`. If the cache is at capacity and `key` is new, a
    /// victim is selected and evicted (demoted to the archive if one is
    /// attached) before the new entry is inserted.
    pub fn put(&self, key: Key, value: Value) -> Result<()> {
        if matches!(self.policy, Policy::No) {
            if let Some(archive) = &self.archive {
                archive.put(&key, value)?;
            }
            return Ok(());
        }

        let victim = {
            let mut inner = self.inner.lock();
            let clock = inner.tick();
            if let Some(entry) = inner.map.get_mut(&key) {
                entry.value = value.clone();
                entry.touch(clock);
                return Ok(());
            }
            let victim = if self.policy.evicts() && inner.map.len() >= self.capacity {
                select_victim(self.policy, &inner.map).and_then(|vk| inner.map.remove(&vk).map(|e| (vk, e.value)))
            } else {
                None
            };
            let seq = inner.next_sequence();
            inner.map.insert(key, Entry::new(value, seq));
            victim
        };

        if let Some((victim_key, victim_value)) = victim {
            if let Some(archive) = &self.archive {
                // Eviction completes even if the archive write fails; the
                // value is lost from memory and the error surfaces to the
                // caller.
                archive.put(&victim_key, victim_value)?;
            }
        }
        Ok(())
    }

    pub fn delete(&self, key: &Key) -> Option<Value> {
        let mut inner = self.inner.lock();
        inner.map.remove(key).map(|e| e.value)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.inner.lock().map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<Key> {
        self.inner.lock().map.keys().cloned().collect()
    }

    /// Snapshot of every `(key, value)` pair currently in memory.
    pub fn iter(&self) -> Vec<(Key, Value)> {
        self.inner
            .lock()
            .map
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.inner.lock().map.clear();
    }

    /// `C.load(K)`: pulls keys from the archive into memory without
    /// updating policy metadata, so freshly loaded entries start at the
    /// bottom of LRU order rather than looking recently used.
    pub fn load(&self, selector: KeySelector<'_>) -> Result<usize> {
        let Some(archive) = self.archive.clone() else {
            return Ok(0);
        };
        let keys: Vec<Key> = match selector {
            KeySelector::All => archive.keys()?,
            KeySelector::Keys(ks) => ks.to_vec(),
        };
        let mut loaded = 0;
        for key in keys {
            let found = match archive.get(&key) {
                Ok(v) => v,
                Err(_) if self.ignore_missing => None,
                Err(e) => return Err(e),
            };
            if let Some(value) = found {
                self.load_without_touch(key, value);
                loaded += 1;
            }
        }
        self.stats.loads.fetch_add(loaded as u64, Ordering::Relaxed);
        Ok(loaded)
    }

    /// Consults the archive for `key` on a cache miss and, if found,
    /// inserts it into memory (promotion). Returns `Ok(None)` both when
    /// there's no archive and when the archive missed. An archive *error*
    /// propagates unless [`Self::with_ignore_missing`] downgraded it to a
    /// miss.
    pub fn promote(&self, key: &Key) -> Result<Option<Value>> {
        let Some(archive) = &self.archive else {
            return Ok(None);
        };
        let found = match archive.get(key) {
            Ok(v) => v,
            Err(_) if self.ignore_missing => None,
            Err(e) => return Err(e),
        };
        if let Some(value) = &found {
            self.put(key.clone(), value.clone())?;
            self.stats.loads.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    fn load_without_touch(&self, key: Key, value: Value) {
        if matches!(self.policy, Policy::No) {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.map.contains_key(&key) {
            // Loading shouldn't overwrite a fresher in-memory value; the
            // cache is authoritative between sync points.
            return;
        }
        let victim = if self.policy.evicts() && inner.map.len() >= self.capacity {
            select_victim(self.policy, &inner.map)
        } else {
            None
        };
        if let Some(vk) = victim {
            inner.map.remove(&vk);
        }
        // Loaded entries get the oldest possible recency stamp (0) so they
        // sit at the bottom of LRU/MRU order rather than looking just
        // accessed; insertion order still advances so ties resolve
        // sensibly.
        let seq = inner.next_sequence();
        inner.map.insert(
            key,
            Entry {
                value,
                inserted_at: seq,
                last_access: 0,
                access_count: 0,
            },
        );
    }

    /// `C.dump(K)`: writes keys present in both `K` and memory out to the
    /// archive.
    pub fn dump(&self, selector: KeySelector<'_>) -> Result<usize> {
        let Some(archive) = self.archive.clone() else {
            return Ok(0);
        };
        let snapshot = self.iter();
        let mut dumped = 0;
        for (key, value) in snapshot {
            let include = match selector {
                KeySelector::All => true,
                KeySelector::Keys(ks) => ks.contains(&key),
            };
            if include {
                archive.put(&key, value)?;
                dumped += 1;
            }
        }
        Ok(dumped)
    }

    /// `C.sync()`: `load(*)` followed by `dump(*)`, dump winning on any
    /// collision since it runs second.
    pub fn sync(&self) -> Result<()> {
        self.load(KeySelector::All)?;
        self.dump(KeySelector::All)?;
        Ok(())
    }

    /// `C.drop()`: discards the in-memory working set without touching
    /// the archive.
    pub fn drop_working_set(&self) {
        self.clear();
    }
}

pub use policy::Policy as EvictionPolicy;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::InMemoryArchive;
    use proptest::prelude::*;

    fn key(n: i64) -> Key {
        Key::Str(n.to_string())
    }

    fn val(n: i64) -> Value {
        Value::from_bytes(n.to_le_bytes().to_vec())
    }

    #[test]
    fn lru_evicts_in_insertion_order_under_workload() {
        let cache = Cache::new(Policy::Lru, 3, None).unwrap();
        for i in 1..=4 {
            cache.put(key(i), val(i)).unwrap();
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(4)));
    }

    #[test]
    fn mru_evicts_most_recently_used() {
        let cache = Cache::new(Policy::Mru, 2, None).unwrap();
        cache.put(key(1), val(1)).unwrap();
        cache.put(key(2), val(2)).unwrap();
        cache.get(&key(2)); // 2 is now most-recently used
        cache.put(key(3), val(3)).unwrap();
        assert!(!cache.contains(&key(2)));
        assert!(cache.contains(&key(1)));
        assert!(cache.contains(&key(3)));
    }

    #[test]
    fn lfu_evicts_lowest_access_count() {
        let cache = Cache::new(Policy::Lfu, 2, None).unwrap();
        cache.put(key(1), val(1)).unwrap();
        cache.put(key(2), val(2)).unwrap();
        for _ in 0..5 {
            cache.get(&key(1));
        }
        cache.put(key(3), val(3)).unwrap();
        assert!(!cache.contains(&key(2)));
        assert!(cache.contains(&key(1)));
    }

    #[test]
    fn capacity_never_exceeded() {
        let cache = Cache::new(Policy::Lru, 5, None).unwrap();
        for i in 0..100 {
            cache.put(key(i), val(i)).unwrap();
            assert!(cache.len() <= cache.capacity());
        }
    }

    #[test]
    fn eviction_demotes_to_archive() {
        let archive = Arc::new(InMemoryArchive::new());
        let cache = Cache::new(Policy::Lru, 2, Some(archive.clone() as Arc<dyn Archive>)).unwrap();
        cache.put(key(1), val(1)).unwrap();
        cache.put(key(2), val(2)).unwrap();
        cache.put(key(3), val(3)).unwrap(); // evicts 1
        assert!(archive.contains(&key(1)).unwrap());
        assert!(!cache.contains(&key(1)));
    }

    #[test]
    fn no_cache_is_pure_pass_through() {
        let archive = Arc::new(InMemoryArchive::new());
        let cache = Cache::new(Policy::No, 0, Some(archive.clone() as Arc<dyn Archive>)).unwrap();
        cache.put(key(1), val(1)).unwrap();
        assert_eq!(cache.len(), 0);
        assert!(archive.contains(&key(1)).unwrap());
        assert_eq!(cache.get(&key(1)), Some(val(1)));
    }

    #[test]
    fn inf_never_evicts() {
        let cache = Cache::new(Policy::Inf, 1, None).unwrap();
        for i in 0..1000 {
            cache.put(key(i), val(i)).unwrap();
        }
        assert_eq!(cache.len(), 1000);
    }

    #[test]
    fn sync_round_trips_between_two_caches_sharing_an_archive() {
        let archive: Arc<dyn Archive> = Arc::new(InMemoryArchive::new());
        let c1 = Cache::new(Policy::Lru, 200, Some(archive.clone())).unwrap();
        for i in 0..100 {
            c1.put(key(i), val(i)).unwrap();
        }
        c1.dump(KeySelector::All).unwrap();

        let c2 = Cache::new(Policy::Lru, 200, Some(archive)).unwrap();
        c2.load(KeySelector::All).unwrap();

        let mut c1_keys = c1.keys();
        let mut c2_keys = c2.keys();
        c1_keys.sort_by_key(|k| k.to_string());
        c2_keys.sort_by_key(|k| k.to_string());
        assert_eq!(c1_keys, c2_keys);
        for k in c1_keys {
            assert_eq!(c1.get(&k), c2.get(&k));
        }
    }

    #[test]
    fn capacity_zero_rejected_for_bounded_policies() {
        assert!(Cache::new(Policy::Lru, 0, None).is_err());
    }

    #[test]
    fn scenario_lru_with_file_archive_end_to_end() {
        // LRU cache backed by an archive, end to end, using the in-memory
        // archive as the file-archive stand-in for a unit test.
        let archive: Arc<dyn Archive> = Arc::new(InMemoryArchive::new());
        let cache = Cache::new(Policy::Lru, 2, Some(archive.clone())).unwrap();

        cache.put(key(1), val(1)).unwrap();
        cache.put(key(2), val(2)).unwrap();
        cache.put(key(3), val(3)).unwrap();
        assert!(cache.contains(&key(2)) && cache.contains(&key(3)));
        assert!(archive.contains(&key(1)).unwrap());

        // Promotion: loading key 1 back from the archive.
        cache.load(KeySelector::Keys(&[key(1)])).unwrap();
        assert_eq!(cache.get(&key(1)), Some(val(1)));

        cache.put(key(4), val(4)).unwrap();
        // One of {2,3} was evicted since the cache holds at most 2 keys;
        // both should now be reachable via the archive.
        assert!(archive.contains(&key(1)).unwrap());
    }

    /// An archive whose every read fails, for exercising the
    /// `ignore_missing` downgrade path.
    struct FailingArchive;

    impl Archive for FailingArchive {
        fn get(&self, _key: &Key) -> Result<Option<Value>> {
            Err(MemoError::archive("simulated backend failure"))
        }
        fn put(&self, _key: &Key, _value: Value) -> Result<()> {
            Ok(())
        }
        fn delete(&self, _key: &Key) -> Result<()> {
            Ok(())
        }
        fn keys(&self) -> Result<Vec<Key>> {
            Ok(vec![])
        }
        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn promote_propagates_archive_errors_by_default() {
        let cache = Cache::new(Policy::Lru, 2, Some(Arc::new(FailingArchive) as Arc<dyn Archive>)).unwrap();
        assert!(cache.promote(&key(1)).is_err());
    }

    #[test]
    fn promote_downgrades_to_miss_when_ignore_missing_is_set() {
        let cache = Cache::new(Policy::Lru, 2, Some(Arc::new(FailingArchive) as Arc<dyn Archive>))
            .unwrap()
            .with_ignore_missing(true);
        assert_eq!(cache.promote(&key(1)).unwrap(), None);
    }

    fn arb_policy() -> impl Strategy<Value = Policy> {
        prop_oneof![
            Just(Policy::Lru),
            Just(Policy::Lfu),
            Just(Policy::Mru),
            Just(Policy::Rr),
        ]
    }

    proptest! {
        /// Spec §8 property 1: `∀` key sequences `S`, `size(Cache) ≤
        /// capacity` after each operation, for every bounded policy.
        #[test]
        fn capacity_is_never_exceeded_for_any_key_sequence_or_policy(
            policy in arb_policy(),
            capacity in 1usize..16,
            keys in prop::collection::vec(any::<i64>(), 0..200),
        ) {
            let cache = Cache::new(policy, capacity, None).unwrap();
            for k in keys {
                cache.put(key(k), val(k)).unwrap();
                prop_assert!(cache.len() <= cache.capacity());
            }
        }
    }
}

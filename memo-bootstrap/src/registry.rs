// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Named-cache registry
//!
//! The source library memoizes at module scope: decorating a function
//! installs it in an implicit, process-wide table keyed by qualified
//! name. Rust has no such table — a decorated closure is just a value —
//! so this registry is the explicit replacement: a binary registers each
//! [`memo::Memoized`]/[`memo::SafeMemoized`] it builds under a name, and
//! anything that needs to enumerate every cache in the process (metrics
//! scraping, a shutdown hook that dumps dirty entries to their archives)
//! looks them up here instead of relying on a global.
//!
//! One concurrent map behind a single `parking_lot::RwLock`, object-safe
//! trait objects standing in for the otherwise-ungroupable generic
//! `Memoized<Args, R, F>` instantiations.

use memo::Stats;
use memo_core::Cache;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The operations a registered cache exposes without revealing its
/// argument/result types, so a [`CacheRegistry`] can hold many different
/// `Memoized<Args, R, F>` instantiations side by side.
pub trait CacheHandle: Send + Sync {
    fn stats(&self) -> Stats;
    fn cache(&self) -> Arc<Cache>;

    fn clear(&self) {
        self.cache().clear()
    }

    /// Flushes every dirty entry to the archive, if one is configured.
    fn dump(&self) -> memo_core::Result<usize> {
        self.cache().dump(memo_core::KeySelector::All)
    }
}

impl<Args, R, F> CacheHandle for memo::Memoized<Args, R, F>
where
    Args: Clone + memo_core::SignatureBinder + Send + Sync + 'static,
    R: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fn(Args) -> R + Send + Sync + 'static,
{
    fn stats(&self) -> Stats {
        memo::Memoized::stats(self)
    }

    fn cache(&self) -> Arc<Cache> {
        memo::Memoized::cache(self)
    }
}

impl<Args, R, F> CacheHandle for memo::SafeMemoized<Args, R, F>
where
    Args: Clone + memo_core::SignatureBinder + Send + Sync + 'static,
    R: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fn(Args) -> R + Send + Sync + 'static,
{
    fn stats(&self) -> Stats {
        memo::SafeMemoized::stats(self)
    }

    fn cache(&self) -> Arc<Cache> {
        memo::SafeMemoized::cache(self)
    }
}

/// A process-wide table of named caches, the non-global stand-in for the
/// source library's implicit module-level memoization.
#[derive(Default)]
pub struct CacheRegistry {
    caches: RwLock<HashMap<String, Arc<dyn CacheHandle>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` under `name`, replacing and returning whatever
    /// was previously registered under that name.
    pub fn register(&self, name: impl Into<String>, handle: impl CacheHandle + 'static) -> Option<Arc<dyn CacheHandle>> {
        let name = name.into();
        let handle: Arc<dyn CacheHandle> = Arc::new(handle);
        tracing::debug!(cache = %name, "registered cache");
        self.caches.write().insert(name, handle)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CacheHandle>> {
        self.caches.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn CacheHandle>> {
        self.caches.write().remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }

    /// A snapshot of every registered cache's stats, keyed by name.
    pub fn stats(&self) -> Vec<(String, Stats)> {
        self.caches.read().iter().map(|(name, handle)| (name.clone(), handle.stats())).collect()
    }

    /// Clears every registered cache. Intended for test teardown and
    /// admin tooling, not the request path.
    pub fn clear_all(&self) {
        for handle in self.caches.read().values() {
            handle.clear();
        }
    }

    /// Dumps every registered cache to its configured archive, logging
    /// (rather than failing the whole sweep) if an individual cache has
    /// no archive or its dump fails — a shutdown hook wants best-effort
    /// persistence, not an all-or-nothing transaction.
    pub fn dump_all(&self) {
        for (name, handle) in self.caches.read().iter() {
            match handle.dump() {
                Ok(written) => tracing::debug!(cache = %name, written, "dumped cache to archive"),
                Err(e) => tracing::warn!(cache = %name, error = %e, "failed to dump cache to archive"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memo_core::{Arg, ArgValue, BincodeEncoder, CanonicalConfig, Call, Keymap, Policy, SignatureBinder};

    #[derive(Debug, Clone)]
    struct Square(i64);

    impl SignatureBinder for Square {
        fn bind(&self) -> Call {
            Call::new(vec![Arg::positional(ArgValue::Int(self.0))])
        }
    }

    fn make_memoized() -> memo::Memoized<Square, i64, impl Fn(Square) -> i64> {
        let keymap = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        let cache = Arc::new(Cache::new(Policy::Lru, 4, None).unwrap());
        memo::Memoized::new(|args: Square| args.0 * args.0, keymap, cache)
    }

    #[test]
    fn registering_a_cache_makes_it_discoverable_by_name() {
        let registry = CacheRegistry::new();
        registry.register("squares", make_memoized());
        assert_eq!(registry.names(), vec!["squares".to_string()]);
        assert!(registry.get("squares").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn stats_reflects_calls_made_through_the_registered_handle() {
        let registry = CacheRegistry::new();
        let memo = make_memoized();
        memo.call(Square(3)).unwrap();
        memo.call(Square(3)).unwrap();
        registry.register("squares", memo);

        let stats = registry.stats();
        let (_, squares_stats) = stats.iter().find(|(name, _)| name == "squares").unwrap();
        assert_eq!(squares_stats.hits, 1);
        assert_eq!(squares_stats.misses, 1);
    }

    #[test]
    fn clear_all_empties_every_registered_cache() {
        let registry = CacheRegistry::new();
        let memo = make_memoized();
        memo.call(Square(3)).unwrap();
        registry.register("squares", memo);

        registry.clear_all();
        let handle = registry.get("squares").unwrap();
        assert_eq!(handle.cache().len(), 0);
    }

    #[test]
    fn registering_the_same_name_twice_returns_the_previous_handle() {
        let registry = CacheRegistry::new();
        registry.register("squares", make_memoized());
        let previous = registry.register("squares", make_memoized());
        assert!(previous.is_some());
    }
}

// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Decorator binding
//!
//! Attaches a cache + keymap + archive triple to a callable and preserves
//! call semantics. [`Memoized`] is the default path: a key error
//! propagates to the caller. [`SafeMemoized`] is the variant that
//! tolerates unkeyable arguments by bypassing the cache.
//!
//! Rust has no variadic `Fn` bound a library can implement for an
//! arbitrary-arity closure on stable, so both wrappers take a single
//! `Args` type per callable. Callers that want to memoize a genuinely
//! multi-argument function define a small struct for its arguments and
//! implement [`memo_core::SignatureBinder`] for it (see `examples/` in
//! this crate's tests) — one generic type parameterized over the thing
//! being wrapped, rather than a family of arity-specific traits.

use memo_core::{Archive, Cache, Encoder, Key, KeySelector, MemoError, Result, SafeKeymap, SignatureBinder};
use memo_core::{BincodeEncoder, Keymap};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A point-in-time snapshot of a decorated callable's counters.
#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub errors: u64,
    pub capacity: usize,
    pub policy: &'static str,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    errors: AtomicU64,
}

impl Counters {
    fn snapshot(&self, capacity: usize, policy: &'static str) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            capacity,
            policy,
        }
    }
}

/// Wraps `f` so each call becomes `cache[keymap(call)]` with
/// miss-computation: compute the key, check the cache, consult the
/// archive on a miss, and finally invoke `f` on a double miss.
pub struct Memoized<Args, R, F> {
    f: F,
    keymap: Keymap<BincodeEncoder>,
    cache: Arc<Cache>,
    encoder: BincodeEncoder,
    counters: Counters,
    _marker: std::marker::PhantomData<(Args, R)>,
}

impl<Args, R, F> Memoized<Args, R, F>
where
    Args: Clone + SignatureBinder,
    R: Serialize + DeserializeOwned + Clone,
    F: Fn(Args) -> R,
{
    pub fn new(f: F, keymap: Keymap<BincodeEncoder>, cache: Arc<Cache>) -> Self {
        Self {
            f,
            keymap,
            cache,
            encoder: BincodeEncoder,
            counters: Counters::default(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Previews the key a call would be stored under, without invoking
    /// `f` or touching the cache.
    pub fn key(&self, args: &Args) -> Result<Key> {
        self.keymap.key(&args.bind())
    }

    pub fn cache(&self) -> Arc<Cache> {
        Arc::clone(&self.cache)
    }

    pub fn archive(&self) -> Option<Arc<dyn Archive>> {
        self.cache.archive()
    }

    pub fn stats(&self) -> Stats {
        self.counters.snapshot(self.cache.capacity(), self.cache.policy().name())
    }

    pub fn load(&self) -> Result<usize> {
        self.cache.load(KeySelector::All)
    }

    pub fn dump(&self) -> Result<usize> {
        self.cache.dump(KeySelector::All)
    }

    pub fn clear(&self) {
        self.cache.clear()
    }

    /// Computes the key, checks the cache, consults the archive on a
    /// cache miss (promotion), and finally invokes `f` on a double miss.
    pub fn call(&self, args: Args) -> Result<R> {
        let key = self.keymap.key(&args.bind())?;

        if let Some(cached) = self.cache.get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return self.encoder.decode(cached.as_bytes());
        }

        if let Some(value) = self.cache.promote(&key)? {
            self.counters.loads.fetch_add(1, Ordering::Relaxed);
            return self.encoder.decode(value.as_bytes());
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let result = (self.f)(args);
        let encoded = self.encoder.encode(&result)?;
        self.cache.put(key, encoded)?;
        Ok(result)
    }
}

/// The safe variant: if the keymap cannot canonicalize the call, bypass
/// the cache entirely and invoke `f` directly. Unlike [`Memoized::call`],
/// this never returns a key-encoding error to the caller — `errors`
/// absorbs it instead.
pub struct SafeMemoized<Args, R, F> {
    f: F,
    safe_keymap: SafeKeymap<BincodeEncoder>,
    cache: Arc<Cache>,
    encoder: BincodeEncoder,
    counters: Counters,
    _marker: std::marker::PhantomData<(Args, R)>,
}

impl<Args, R, F> SafeMemoized<Args, R, F>
where
    Args: Clone + SignatureBinder,
    R: Serialize + DeserializeOwned + Clone,
    F: Fn(Args) -> R,
{
    pub fn new(f: F, primary: Keymap<BincodeEncoder>, cache: Arc<Cache>) -> Self {
        Self {
            f,
            safe_keymap: SafeKeymap::new(primary),
            cache,
            encoder: BincodeEncoder,
            counters: Counters::default(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Previews the key a call would be stored under, without invoking
    /// `f` or touching the cache. `None` if the argument can't be
    /// canonicalized by either the primary or fallback keymap.
    pub fn key(&self, args: &Args) -> Option<Key> {
        self.safe_keymap.try_key(&args.bind())
    }

    pub fn cache(&self) -> Arc<Cache> {
        Arc::clone(&self.cache)
    }

    pub fn archive(&self) -> Option<Arc<dyn Archive>> {
        self.cache.archive()
    }

    pub fn stats(&self) -> Stats {
        self.counters.snapshot(self.cache.capacity(), self.cache.policy().name())
    }

    pub fn load(&self) -> Result<usize> {
        self.cache.load(KeySelector::All)
    }

    pub fn dump(&self) -> Result<usize> {
        self.cache.dump(KeySelector::All)
    }

    pub fn clear(&self) {
        self.cache.clear()
    }

    /// Calls `f`, tolerating arguments the keymap can't canonicalize.
    ///
    /// Returns `Ok(result)` on any successful path — cache hit, archive
    /// promotion, miss-and-compute, or a bypass due to an unkeyable
    /// argument. The only way this returns `Err` is if serializing `f`'s
    /// *result* fails after a real double miss (`ValueEncodingError`,
    /// which is never caught by the safe path).
    pub fn call(&self, args: Args) -> Result<R> {
        let call = args.bind();
        let Some(key) = self.safe_keymap.try_key(&call) else {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            return Ok((self.f)(args));
        };

        if let Some(cached) = self.cache.get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(self
                .encoder
                .decode(cached.as_bytes())
                .map_err(|e| MemoError::invariant(e.to_string()))?);
        }

        if let Some(value) = self.cache.promote(&key)? {
            self.counters.loads.fetch_add(1, Ordering::Relaxed);
            return Ok(self
                .encoder
                .decode(value.as_bytes())
                .map_err(|e| MemoError::invariant(e.to_string()))?);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let result = (self.f)(args);
        let encoded = self.encoder.encode(&result)?;
        self.cache.put(key, encoded)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memo_core::{Arg, ArgValue, Call, CanonicalConfig, Cache, KeymapVariant as Variant, Policy};

    #[derive(Debug, Clone)]
    struct Square(i64);

    impl SignatureBinder for Square {
        fn bind(&self) -> Call {
            Call::new(vec![Arg::positional(ArgValue::Int(self.0))])
        }
    }

    fn make_memoized() -> Memoized<Square, i64, impl Fn(Square) -> i64> {
        let keymap = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        let cache = Arc::new(Cache::new(Policy::Lru, 4, None).unwrap());
        Memoized::new(|args: Square| args.0 * args.0, keymap, cache)
    }

    #[test]
    fn hit_miss_counters_track_calls() {
        let memo = make_memoized();
        assert_eq!(memo.call(Square(3)).unwrap(), 9);
        assert_eq!(memo.call(Square(3)).unwrap(), 9);
        let stats = memo.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[derive(Debug, Clone)]
    struct Flagged {
        x: i64,
        verbose: bool,
    }

    impl SignatureBinder for Flagged {
        fn bind(&self) -> Call {
            Call::new(vec![
                Arg::positional(ArgValue::Int(self.x)),
                Arg::named("verbose", ArgValue::Bool(self.verbose)),
            ])
        }
    }

    #[test]
    fn ignore_list_collapses_calls_to_one_entry() {
        use memo_core::IgnoreList;
        let keymap = Keymap::hash(
            CanonicalConfig {
                ignore: IgnoreList::names(["verbose"]),
                ..Default::default()
            },
            BincodeEncoder,
        );
        let cache = Arc::new(Cache::new(Policy::Lru, 4, None).unwrap());
        let memo = Memoized::new(|args: Flagged| args.x, keymap, cache);
        memo.call(Flagged { x: 1, verbose: true }).unwrap();
        memo.call(Flagged { x: 1, verbose: false }).unwrap();
        assert_eq!(memo.cache().len(), 1);
        assert_eq!(memo.stats().hits, 1);
    }

    /// Stands in for an argument with no stable canonical form.
    #[derive(Clone)]
    struct Unkeyable;

    impl SignatureBinder for Unkeyable {
        fn bind(&self) -> Call {
            Call::new(vec![Arg::positional(ArgValue::Unrepresentable)])
        }
    }

    #[test]
    fn safe_variant_increments_errors_not_hits_or_misses() {
        let keymap = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        let cache = Arc::new(Cache::new(Policy::Lru, 4, None).unwrap());
        let memo = SafeMemoized::new(|_: Unkeyable| 42i64, keymap, cache);
        assert_eq!(memo.call(Unkeyable).unwrap(), 42);
        assert_eq!(memo.call(Unkeyable).unwrap(), 42);
        assert_eq!(memo.stats().hits, 0);
        assert_eq!(memo.stats().misses, 0);
        assert_eq!(memo.stats().errors, 2);
        assert_eq!(memo.cache().len(), 0);
    }

    #[test]
    fn non_safe_variant_propagates_the_key_encoding_error() {
        let keymap = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        let cache = Arc::new(Cache::new(Policy::Lru, 4, None).unwrap());
        let memo = Memoized::new(|_: Unkeyable| 42i64, keymap, cache);
        assert!(memo.call(Unkeyable).is_err());
    }

    #[test]
    fn safe_variant_exposes_the_same_surface_as_the_default_variant() {
        let keymap = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        let cache = Arc::new(Cache::new(Policy::Lru, 4, None).unwrap());
        let memo = SafeMemoized::new(|args: Square| args.0 * args.0, keymap, cache);
        assert!(memo.key(&Square(3)).is_some());
        assert_eq!(memo.call(Square(3)).unwrap(), 9);
        // No archive is attached, so dump/load are no-ops that report zero
        // keys touched rather than erroring.
        assert_eq!(memo.dump().unwrap(), 0);
        memo.clear();
        assert_eq!(memo.cache().len(), 0);
        assert_eq!(memo.load().unwrap(), 0);
        assert!(memo.archive().is_none());
    }

    #[test]
    fn safe_variant_key_returns_none_for_an_unkeyable_argument() {
        let keymap = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        let cache = Arc::new(Cache::new(Policy::Lru, 4, None).unwrap());
        let memo = SafeMemoized::new(|_: Unkeyable| 42i64, keymap, cache);
        assert!(memo.key(&Unkeyable).is_none());
    }
}

// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Keymap variants
//!
//! Four ways to turn a canonicalized call into a [`Key`]: `Raw` (the
//! canonical tree itself), `Hash` (a digest of it), `String` (a
//! printable encoding of it), and `Pickle` (its full serialized bytes).
//! [`Keymap`] picks one variant and applies it after canonicalization;
//! [`SafeKeymap`] wraps any `Keymap` with degrade-on-failure behavior.

use crate::encoder::Encoder;
use crate::error::{MemoError, Result};
use crate::key::Key;
use crate::keymap::canonical::{canonicalize, contains_unrepresentable, CanonicalConfig, Call};

/// Which of the four encodings a [`Keymap`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Key is the canonical argument tree itself: comparable, but only
    /// useful when every argument is structurally comparable.
    Raw,
    /// Key is `fingerprint(canonicalize(args))`: short, fixed-width, not
    /// provably injective but collision-negligible.
    Hash,
    /// Key is `stringify(canonicalize(args))`: human-readable, used for
    /// directory/SQL archives.
    Str,
    /// Key is `encode(canonicalize(args))`: injective for any
    /// serializable value, used when arguments contain rich object
    /// graphs.
    Pickle,
}

/// Converts a bound call into a [`Key`] by canonicalizing it and then
/// encoding the canonical form per the selected [`Variant`].
#[derive(Clone)]
pub struct Keymap<E> {
    variant: Variant,
    config: CanonicalConfig,
    encoder: E,
}

impl<E: Encoder> Keymap<E> {
    pub fn new(variant: Variant, config: CanonicalConfig, encoder: E) -> Self {
        Self { variant, config, encoder }
    }

    pub fn raw(config: CanonicalConfig, encoder: E) -> Self {
        Self::new(Variant::Raw, config, encoder)
    }

    pub fn hash(config: CanonicalConfig, encoder: E) -> Self {
        Self::new(Variant::Hash, config, encoder)
    }

    pub fn string(config: CanonicalConfig, encoder: E) -> Self {
        Self::new(Variant::Str, config, encoder)
    }

    pub fn pickle(config: CanonicalConfig, encoder: E) -> Self {
        Self::new(Variant::Pickle, config, encoder)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Derives a `Hash`-variant keymap that shares this keymap's
    /// canonicalization policy: composing raw → hash first canonicalizes
    /// arguments, then digests them. Both stages share one
    /// [`CanonicalConfig`], so composing is just re-tagging the variant
    /// rather than re-deriving policy.
    pub fn composed_with_hash(&self) -> Keymap<E>
    where
        E: Clone,
    {
        Keymap::hash(self.config.clone(), self.encoder.clone())
    }

    /// Computes the [`Key`] for one call.
    ///
    /// Fails with `KeyEncodingError` if canonicalization produced a
    /// [`crate::key::CanonArg::Unrepresentable`] node anywhere in the
    /// tree — an argument the caller's `SignatureBinder` could not
    /// reduce to a stable canonical form. No variant can encode such a
    /// tree, so the check is variant-independent and happens before the
    /// match.
    pub fn key(&self, call: &Call) -> Result<Key> {
        let canon = canonicalize(call, &self.config);
        if contains_unrepresentable(&canon) {
            return Err(MemoError::key_encoding(
                "argument could not be canonicalized into a stable key",
            ));
        }
        match self.variant {
            Variant::Raw => {
                let crate::key::CanonArg::Seq(items) = canon else {
                    unreachable!("canonicalize always returns CanonArg::Seq")
                };
                Ok(Key::Tuple(items))
            }
            Variant::Hash => self
                .encoder
                .fingerprint(&canon)
                .map(Key::Digest)
                .map_err(|e| MemoError::key_encoding(e.to_string())),
            Variant::Str => self
                .encoder
                .stringify(&canon)
                .map(Key::Str)
                .map_err(|e| MemoError::key_encoding(e.to_string())),
            Variant::Pickle => self
                .encoder
                .encode(&canon)
                .map(Key::Bytes)
                .map_err(|e| MemoError::key_encoding(e.to_string())),
        }
    }
}

/// Wraps any [`Keymap`] with a safe-mode fallback: if the
/// primary variant fails to encode, fall back to the `String` variant; if
/// that also fails, the call is uncacheable and the caller (the
/// `SafeMemoized` decorator) must invoke the wrapped function directly
/// without inserting into the cache.
pub struct SafeKeymap<E> {
    primary: Keymap<E>,
    fallback: Keymap<E>,
}

impl<E: Encoder + Clone> SafeKeymap<E> {
    pub fn new(primary: Keymap<E>) -> Self {
        let fallback = Keymap::string(primary.config.clone(), primary.encoder.clone());
        Self { primary, fallback }
    }

    /// Returns `Ok(Some(key))` on success, `Ok(None)` when both the
    /// primary and fallback variants failed to encode (the call must
    /// bypass the cache entirely), and never `Err` — safe mode never
    /// propagates a key-encoding failure.
    pub fn try_key(&self, call: &Call) -> Option<Key> {
        match self.primary.key(call) {
            Ok(key) => Some(key),
            Err(_) => self.fallback.key(call).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BincodeEncoder;
    use crate::keymap::canonical::{Arg, ArgValue};
    use proptest::prelude::*;

    fn call(args: Vec<Arg>) -> Call {
        Call::new(args)
    }

    #[test]
    fn hash_variant_typed_distinguishes_int_and_float() {
        let typed_config = CanonicalConfig {
            typed: true,
            ..Default::default()
        };
        let km = Keymap::hash(typed_config, BincodeEncoder);
        let a = km.key(&call(vec![Arg::positional(ArgValue::Int(1))])).unwrap();
        let b = km.key(&call(vec![Arg::positional(ArgValue::Float(1.0))])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_variant_untyped_unifies_int_and_float_with_same_bits() {
        let km = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        // Untyped int 1 and float 1.0 still differ: the canonical shapes
        // (Int vs FloatBits) are different payload kinds even without a
        // type tag. Two calls canonicalizing to the *same* shape collide;
        // these two inputs shouldn't, asserting Hash is sensitive to shape.
        let a = km.key(&call(vec![Arg::positional(ArgValue::Int(1))])).unwrap();
        let b = km.key(&call(vec![Arg::positional(ArgValue::Int(1))])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn raw_variant_produces_tuple_key() {
        let km = Keymap::raw(CanonicalConfig::default(), BincodeEncoder);
        let key = km.key(&call(vec![Arg::positional(ArgValue::Int(7))])).unwrap();
        assert!(matches!(key, Key::Tuple(_)));
    }

    #[test]
    fn string_variant_is_stable() {
        let km = Keymap::string(CanonicalConfig::default(), BincodeEncoder);
        let a = km.key(&call(vec![Arg::positional(ArgValue::Str("x".into()))])).unwrap();
        let b = km.key(&call(vec![Arg::positional(ArgValue::Str("x".into()))])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unrepresentable_argument_fails_every_variant() {
        let unkeyable = call(vec![Arg::positional(ArgValue::Unrepresentable)]);
        for variant_km in [
            Keymap::raw(CanonicalConfig::default(), BincodeEncoder),
            Keymap::hash(CanonicalConfig::default(), BincodeEncoder),
            Keymap::string(CanonicalConfig::default(), BincodeEncoder),
            Keymap::pickle(CanonicalConfig::default(), BincodeEncoder),
        ] {
            assert!(variant_km.key(&unkeyable).is_err());
        }
    }

    #[test]
    fn safe_keymap_degrades_to_none_when_even_the_fallback_cannot_encode() {
        let primary = Keymap::hash(CanonicalConfig::default(), BincodeEncoder);
        let safe = SafeKeymap::new(primary);
        let unkeyable = call(vec![Arg::positional(ArgValue::Unrepresentable)]);
        assert_eq!(safe.try_key(&unkeyable), None);
    }

    #[test]
    fn composed_with_hash_shares_canonicalization_policy() {
        let raw = Keymap::raw(
            CanonicalConfig {
                typed: true,
                ..Default::default()
            },
            BincodeEncoder,
        );
        let hashed = raw.composed_with_hash();
        assert_eq!(hashed.variant(), Variant::Hash);
    }

    fn arb_args() -> impl Strategy<Value = Vec<Arg>> {
        prop::collection::vec(
            prop_oneof![
                any::<i64>().prop_map(ArgValue::Int),
                any::<String>().prop_map(ArgValue::Str),
                any::<bool>().prop_map(ArgValue::Bool),
            ],
            0..8,
        )
        .prop_map(|values| values.into_iter().map(Arg::positional).collect())
    }

    proptest! {
        /// Spec §8 property 2: `∀ (pos, named)` that canonicalize
        /// identically under keymap `M`, `M(pos, named)` is byte-equal —
        /// checked here by building two independent `Call`s from the same
        /// argument values and confirming every variant produces the same
        /// `Key` both times.
        #[test]
        fn same_arguments_produce_byte_identical_keys_for_every_variant(args in arb_args()) {
            let call_a = call(args.clone());
            let call_b = call(args);
            for variant_km in [
                Keymap::raw(CanonicalConfig::default(), BincodeEncoder),
                Keymap::hash(CanonicalConfig::default(), BincodeEncoder),
                Keymap::string(CanonicalConfig::default(), BincodeEncoder),
                Keymap::pickle(CanonicalConfig::default(), BincodeEncoder),
            ] {
                prop_assert_eq!(variant_km.key(&call_a).unwrap(), variant_km.key(&call_b).unwrap());
            }
        }
    }
}

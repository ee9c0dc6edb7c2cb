// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key
//!
//! A canonical representation of a call signature. The concrete shape
//! depends on which keymap variant produced it: an opaque tuple-like
//! sequence for `Raw`, a fixed-width digest for `Hash`, a printable
//! string for `String`, or a serialized byte string for `Pickle`. All
//! four forms implement `Eq`/`Hash` so a `Key` can be used directly as a
//! `HashMap` key regardless of which variant produced it.

use crate::value::{Digest, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single canonicalized argument, used by the `Raw`/`Tuple` key form.
///
/// Produced by [`crate::keymap::canonical::canonicalize`] from a bound call
/// signature. Carries enough structure to support structural equality —
/// the `Raw` variant requires values be comparable this way — without
/// needing the original argument type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonArg {
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// IEEE-754 bit pattern, already passed through
    /// [`crate::encoder::canonical_f64_bits`] so that all NaN payloads
    /// compare and hash equal.
    FloatBits(u64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<CanonArg>),
    /// A named (keyword) argument that survived the ignore list.
    Named(String, Box<CanonArg>),
    /// Wraps a value with a type discriminant, used by the `typed` typing
    /// policy so e.g. `1` (Int) and `1.0` (FloatBits) never collide even
    /// when their underlying bytes happen to coincide.
    Typed(&'static str, Box<CanonArg>),
    /// An argument a [`crate::keymap::canonical::SignatureBinder`] could
    /// not flatten into any of the above shapes — an argument with no
    /// stable canonical form at all. No keymap variant can encode a tree
    /// containing this node; its presence is exactly what makes
    /// [`crate::keymap::Keymap::key`] return `KeyEncodingError`, which the
    /// safe decorator path catches.
    Unrepresentable,
}

/// A canonical cache key.
///
/// Equality and hashing are exactly the equality/hashing of the concrete
/// variant; two `Key`s from different keymap variants are never compared
/// against each other in practice (a `Cache` is built against exactly one
/// keymap), but `Key` implements `Eq`/`Hash` uniformly anyway so it can sit
/// in a single `HashMap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// `Raw` variant: the canonicalized argument sequence itself.
    Tuple(Vec<CanonArg>),
    /// `Hash` variant: a fixed-width fingerprint of the canonical form.
    Digest(Digest),
    /// `String` variant: a stable textual encoding of the canonical form.
    Str(String),
    /// `Pickle` variant: the canonical form's full serialized bytes.
    Bytes(Value),
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Tuple(args) => {
                0u8.hash(state);
                args.hash(state);
            }
            Key::Digest(d) => {
                1u8.hash(state);
                d.hash(state);
            }
            Key::Str(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Key::Bytes(v) => {
                3u8.hash(state);
                v.as_bytes().hash(state);
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Tuple(args) => write!(f, "{:?}", args),
            Key::Digest(d) => write!(f, "{}", d),
            Key::Str(s) => write!(f, "{}", s),
            Key::Bytes(v) => write!(f, "{}", hex::encode(v.as_bytes())),
        }
    }
}

impl Key {
    /// Filesystem/URL-safe filename for this key, used by the directory
    /// archive. Digest and Pickle keys use their natural byte encoding;
    /// Str keys are already safe; Tuple keys fall back to hashing their
    /// debug representation since a raw tuple has no canonical byte form
    /// of its own.
    pub fn encode_filename(&self) -> String {
        use base64::Engine;
        match self {
            Key::Digest(d) => d.to_base64_url(),
            Key::Bytes(v) => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(v.as_bytes()),
            Key::Str(s) => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(s.as_bytes()),
            Key::Tuple(_) => {
                use sha2::{Digest as _, Sha256};
                let mut hasher = Sha256::new();
                hasher.update(format!("{:?}", self).as_bytes());
                base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
            }
        }
    }
}

// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Encoder
//!
//! Serializes and hashes arbitrary, already-`Serialize`/`Deserialize` values
//! into the byte/string/digest forms the keymap variants need. This is the
//! one place the core touches a concrete serialization format; everything
//! above it works with [`crate::value::Value`] and [`crate::value::Digest`].
//!
//! `encode`/`decode` use `bincode` (deterministic, compact). `fingerprint`
//! hashes the bincode encoding with SHA-256. `stringify` base64-encodes
//! it.
//!
//! Determinism note: `bincode`'s struct/tuple/sequence encoding is
//! byte-stable for a given input within a process and across processes
//! compiled from the same schema, which is what persisted keys require.

use crate::error::{MemoError, Result};
use crate::value::{Digest, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest as _, Sha256};

/// The canonical bit pattern substituted for every NaN payload before
/// hashing or stringifying, so that `NaN` always fingerprints identically
/// regardless of its specific (signaling/quiet, signed) bit pattern.
pub const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// Collapses any NaN `f64` to [`CANONICAL_NAN_BITS`] before taking its bit
/// representation; non-NaN values pass through `to_bits()` unchanged.
///
/// Two floats with the same canonical bits are guaranteed to fingerprint
/// identically even though `NaN != NaN` under IEEE-754 equality.
pub fn canonical_f64_bits(f: f64) -> u64 {
    if f.is_nan() {
        CANONICAL_NAN_BITS
    } else {
        f.to_bits()
    }
}

/// Serializes, hashes, and stringifies opaque values on behalf of the
/// keymap variants.
///
/// Implementations MUST be deterministic for identical inputs within a
/// process; the default [`BincodeEncoder`] is additionally stable across
/// processes and Rust compilations of the same type, which is required for
/// keys that are persisted to an archive.
pub trait Encoder: Send + Sync {
    /// Serializes `value` to its canonical byte representation.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Value>;

    /// Inverse of [`Encoder::encode`].
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;

    /// Fixed-width content digest of `value`'s canonical encoding.
    fn fingerprint<T: Serialize>(&self, value: &T) -> Result<Digest> {
        let bytes = self.encode(value)?;
        let mut hasher = Sha256::new();
        hasher.update(bytes.as_bytes());
        let out = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&out);
        Ok(Digest(digest))
    }

    /// Stable, printable textual form of `value`, suitable for directory
    /// filenames and SQL TEXT columns.
    fn stringify<T: Serialize>(&self, value: &T) -> Result<String> {
        use base64::Engine;
        let bytes = self.encode(value)?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes.as_bytes()))
    }
}

/// The default encoder: `bincode` for encode/decode, SHA-256 for
/// fingerprints, URL-safe base64 for stringification.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeEncoder;

impl Encoder for BincodeEncoder {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Value> {
        bincode::serialize(value)
            .map(Value::from_bytes)
            .map_err(|e| MemoError::value_encoding(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| MemoError::value_encoding(e.to_string()))
    }
}

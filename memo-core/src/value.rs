// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Opaque value payloads and fixed-width digests.
//!
//! The core never inspects a cached value's structure; it only moves bytes
//! produced by the [`crate::encoder::Encoder`] around. `Value` is that byte
//! envelope, cheap to clone because it wraps an `Arc<[u8]>`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A serialized, opaque payload. Values are produced by
/// [`crate::encoder::Encoder::encode`] and never interpreted by the cache or
/// archive layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value(Arc<[u8]>);

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        Ok(Value::from_bytes(bytes))
    }
}

impl Value {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into().into_boxed_slice()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for Value {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A fixed-width content digest produced by [`crate::encoder::Encoder::fingerprint`].
///
/// 32 bytes: the output width of the SHA-256 fingerprint. Collision
/// probability at this width is negligible for the purposes of the `Hash`
/// keymap variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Filesystem/URL-safe encoding, used by the directory archive for
    /// filenames derived from digest keys.
    pub fn to_base64_url(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.0)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # memo-core
//!
//! The pure, synchronous domain of a persistent memoization library:
//! canonical key derivation, bounded eviction policies, and the archive
//! contract those caches synchronize against. Nothing in this crate
//! performs I/O or depends on an async runtime — that's the job of the
//! `memo` crate, which builds concrete file/directory/SQLite archives and
//! the decorator binding on top of these types.
//!
//! ## Module Structure
//!
//! - [`value`] — the opaque [`value::Value`] payload and [`value::Digest`]
//!   fingerprint types every other module moves around.
//! - [`encoder`] — serialize/hash/stringify, plus the canonical-NaN
//!   fingerprinting rule.
//! - [`key`] — [`key::Key`], the four concrete shapes a canonical call
//!   signature can take.
//! - [`keymap`] — turns a bound call into a [`key::Key`] under a selected
//!   variant, with the typing/flattening/ignore canonicalization policy
//!   and the safe-mode fallback.
//! - [`cache`] — the bounded `Key → Entry` mapping with LRU/LFU/MRU/RR/
//!   unbounded/no-cache eviction policies and archive demotion/promotion.
//! - [`archive`] — the durable mapping contract, with the two
//!   I/O-free backends (in-memory, null) that ship in this crate.
//! - [`error`] — the unified [`error::MemoError`] error enum.

pub mod archive;
pub mod cache;
pub mod encoder;
pub mod error;
pub mod key;
pub mod keymap;
pub mod value;

pub use archive::Archive;
pub use cache::{Cache, EvictionPolicy as Policy, KeySelector};
pub use encoder::{BincodeEncoder, Encoder};
pub use error::{MemoError, Result};
pub use key::{CanonArg, Key};
pub use keymap::{
    Arg, ArgValue, Call, CanonicalConfig, IgnoreList, Keymap, SafeKeymap, SignatureBinder, Variant as KeymapVariant,
};
pub use value::{Digest, Value};

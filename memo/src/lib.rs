// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # memo
//!
//! Decorator binding, I/O-backed archives, configuration, logging, and
//! metrics built on top of [`memo_core`]'s pure domain types. Re-exports
//! the domain types callers need most often so simple use sites don't
//! have to depend on `memo-core` directly.
//!
//! ## Module Structure
//!
//! - [`decorator`] — [`decorator::Memoized`] / [`decorator::SafeMemoized`],
//!   binding a cache + keymap + archive triple to a callable.
//! - [`archive`] — the I/O-backed archive backends: file blob, directory,
//!   SQLite (single- and multi-table), and the hierarchical-dataset stub.
//! - [`config`] — [`config::MemoConfig`], layered file-then-environment
//!   configuration for a cache's defaults.
//! - [`infrastructure`] — `tracing` logging/observability and Prometheus
//!   metrics.

pub mod archive;
pub mod config;
pub mod decorator;
pub mod infrastructure;

pub use decorator::{Memoized, SafeMemoized, Stats};
pub use memo_core::{
    Arg, ArgValue, BincodeEncoder, Cache, Call, CanonArg, CanonicalConfig, Digest, Encoder, IgnoreList, Key, Keymap,
    KeySelector, KeymapVariant, MemoError, Policy, Result, SafeKeymap, SignatureBinder, Value,
};

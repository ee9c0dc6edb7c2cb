// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Error System
//!
//! A single, hierarchical error type for every failure mode the memoization
//! core can produce. Mirrors the domain-error pattern of keeping one
//! `thiserror` enum per crate rather than scattering bespoke error structs
//! per module.
//!
//! ## Error Categories
//!
//! - **Key errors** — the keymap could not canonicalize a call
//!   (`KeyEncoding`) or the encoder could not serialize a value
//!   (`ValueEncoding`).
//! - **Archive errors** — a backing store failed to read or write
//!   (`Archive`).
//! - **Configuration errors** — a cache was asked to hold a negative or
//!   otherwise invalid capacity (`Capacity`).
//! - **Internal errors** — an invariant the core relies on was violated
//!   (`InvariantViolation`). These are bugs, never caught by the safe
//!   decorator path.

use thiserror::Error;

/// Errors produced by the memoization core.
///
/// Safe keymaps and the safe decorator catch [`MemoError::KeyEncoding`] and
/// [`MemoError::ValueEncoding`]; every other variant propagates to the
/// caller.
#[derive(Error, Debug, Clone)]
pub enum MemoError {
    #[error("key encoding failed: {0}")]
    KeyEncoding(String),

    #[error("value encoding failed: {0}")]
    ValueEncoding(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("invalid capacity: {0}")]
    Capacity(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl MemoError {
    pub fn key_encoding(msg: impl Into<String>) -> Self {
        Self::KeyEncoding(msg.into())
    }

    pub fn value_encoding(msg: impl Into<String>) -> Self {
        Self::ValueEncoding(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::Capacity(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Errors the safe keymap/decorator path is allowed to catch and
    /// degrade from. Everything else propagates.
    pub fn is_key_error(&self) -> bool {
        matches!(self, MemoError::KeyEncoding(_) | MemoError::ValueEncoding(_))
    }

    /// Archive read failures configured with `ignore_missing` are treated
    /// as a cache miss rather than a hard error; this predicate tells
    /// callers whether that downgrade is legal for this error.
    pub fn is_archive_error(&self) -> bool {
        matches!(self, MemoError::Archive(_) | MemoError::Io(_) | MemoError::Database(_))
    }
}

impl From<bincode::Error> for MemoError {
    fn from(e: bincode::Error) -> Self {
        MemoError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for MemoError {
    fn from(e: std::io::Error) -> Self {
        MemoError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MemoError>;

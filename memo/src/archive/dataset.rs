// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Hierarchical dataset archive (stub)
//!
//! A hierarchical, chunked dataset store (the HDF5-equivalent backend)
//! is an external collaborator this crate doesn't pull in — no dataset
//! crate is a dependency here. This module exists so the shape of such a
//! backend is on record: [`DatasetHandle`] is what a concrete dataset
//! library adapter would implement, and [`DatasetArchive`] is the
//! [`Archive`] wrapper around one. Constructing a [`DatasetArchive`] is
//! always possible; every operation on it fails, since there's no handle
//! implementation in this tree to delegate to.

use memo_core::{Archive, Key, MemoError, Result, Value};
use std::marker::PhantomData;

/// What a concrete hierarchical-dataset library would need to expose for
/// [`DatasetArchive`] to drive it. No implementation of this trait ships
/// in this crate.
pub trait DatasetHandle: Send + Sync {
    fn read_entry(&self, key: &Key) -> Result<Option<Value>>;
    fn write_entry(&self, key: &Key, value: Value) -> Result<()>;
    fn remove_entry(&self, key: &Key) -> Result<()>;
    fn list_entries(&self) -> Result<Vec<Key>>;
}

pub struct DatasetArchive<D: DatasetHandle> {
    _handle: PhantomData<D>,
}

impl<D: DatasetHandle> DatasetArchive<D> {
    /// There is currently no [`DatasetHandle`] implementation to hold, so
    /// this always fails; the constructor exists to give this backend a
    /// name callers can reference (and a place to wire a handle in, once
    /// one exists) without it silently compiling away.
    pub fn new(_handle: D) -> Result<Self> {
        Err(MemoError::archive(
            "hierarchical dataset archive has no backing DatasetHandle implementation in this crate",
        ))
    }
}

impl<D: DatasetHandle> Archive for DatasetArchive<D> {
    fn get(&self, _key: &Key) -> Result<Option<Value>> {
        Err(MemoError::archive("dataset archive is unimplemented"))
    }

    fn put(&self, _key: &Key, _value: Value) -> Result<()> {
        Err(MemoError::archive("dataset archive is unimplemented"))
    }

    fn delete(&self, _key: &Key) -> Result<()> {
        Err(MemoError::archive("dataset archive is unimplemented"))
    }

    fn keys(&self) -> Result<Vec<Key>> {
        Err(MemoError::archive("dataset archive is unimplemented"))
    }

    fn clear(&self) -> Result<()> {
        Err(MemoError::archive("dataset archive is unimplemented"))
    }
}

// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Single-file blob archive
//!
//! One serialized mapping at a path: `[VERSION_BYTE][BINCODE_BODY]` — a
//! version byte for forward compatibility, and the payload.
//!
//! `load` deserializes the entire mapping into memory; `dump` serializes
//! it back atomically via temp-file-then-rename. Concurrent writers from
//! multiple processes are NOT safe without external locking; readers
//! always see either the old or the new complete file, never a partial
//! one, because rename is atomic on the same filesystem.

use memo_core::{Archive, Key, MemoError, Result, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current on-disk format version. Bump and branch on this byte if the
/// body layout ever changes; old files remain readable as long as this
/// module keeps a decode path for their version.
const FORMAT_VERSION: u8 = 1;

pub struct FileBlobArchive {
    path: PathBuf,
    // Guards read-modify-write races within one process; cross-process
    // coordination is the caller's responsibility.
    guard: Mutex<()>,
}

impl FileBlobArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<HashMap<Key, Value>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = fs::read(&self.path)?;
        if bytes.is_empty() {
            return Ok(HashMap::new());
        }
        let (version, body) = bytes
            .split_first()
            .ok_or_else(|| MemoError::archive("truncated archive file"))?;
        match *version {
            FORMAT_VERSION => bincode::deserialize(body).map_err(|e| MemoError::archive(e.to_string())),
            other => Err(MemoError::archive(format!("unsupported archive format version {other}"))),
        }
    }

    fn write_map(&self, map: &HashMap<Key, Value>) -> Result<()> {
        let body = bincode::serialize(map).map_err(|e| MemoError::archive(e.to_string()))?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&body);

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&out)?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| MemoError::archive(e.to_string()))?;
        Ok(())
    }
}

impl Archive for FileBlobArchive {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        let _lock = self.guard.lock();
        Ok(self.read_map()?.remove(key))
    }

    fn put(&self, key: &Key, value: Value) -> Result<()> {
        let _lock = self.guard.lock();
        let mut map = self.read_map()?;
        map.insert(key.clone(), value);
        self.write_map(&map)
    }

    fn delete(&self, key: &Key) -> Result<()> {
        let _lock = self.guard.lock();
        let mut map = self.read_map()?;
        map.remove(key);
        self.write_map(&map)
    }

    fn keys(&self) -> Result<Vec<Key>> {
        let _lock = self.guard.lock();
        Ok(self.read_map()?.into_keys().collect())
    }

    fn len(&self) -> Result<usize> {
        let _lock = self.guard.lock();
        Ok(self.read_map()?.len())
    }

    fn clear(&self) -> Result<()> {
        let _lock = self.guard.lock();
        self.write_map(&HashMap::new())
    }
}

// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The null archive: discards every write, reports every read as a miss.
//! Used to disable archiving uniformly without special-casing "no archive"
//! throughout the cache.

use super::Archive;
use crate::error::Result;
use crate::key::Key;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullArchive;

impl Archive for NullArchive {
    fn get(&self, _key: &Key) -> Result<Option<Value>> {
        Ok(None)
    }

    fn put(&self, _key: &Key, _value: Value) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _key: &Key) -> Result<()> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<Key>> {
        Ok(Vec::new())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

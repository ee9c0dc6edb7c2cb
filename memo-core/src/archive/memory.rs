// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! An in-process dictionary that also exposes the archive interface, used
//! for testing and for composing a `Cache` in front of another `Cache`'s
//! working set.

use super::Archive;
use crate::error::Result;
use crate::key::Key;
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryArchive {
    map: RwLock<HashMap<Key, Value>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Archive for InMemoryArchive {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&self, key: &Key, value: Value) -> Result<()> {
        self.map.write().insert(key.clone(), value);
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<()> {
        self.map.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<Key>> {
        Ok(self.map.read().keys().cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.map.read().len())
    }

    fn clear(&self) -> Result<()> {
        self.map.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_a_value() {
        let archive = InMemoryArchive::new();
        let key = Key::Str("k".into());
        archive.put(&key, Value::from_bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(archive.get(&key).unwrap(), Some(Value::from_bytes(vec![1, 2, 3])));
        assert!(archive.contains(&key).unwrap());
        archive.delete(&key).unwrap();
        assert_eq!(archive.get(&key).unwrap(), None);
    }

    proptest! {
        /// Spec §8 property 3: `∀` archive `A` and key `k`,
        /// `A.put(k, v); A.get(k) == v`.
        #[test]
        fn put_then_get_round_trips_any_key_and_value(
            key_str in ".*",
            bytes in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let archive = InMemoryArchive::new();
            let key = Key::Str(key_str);
            archive.put(&key, Value::from_bytes(bytes.clone())).unwrap();
            prop_assert_eq!(archive.get(&key).unwrap(), Some(Value::from_bytes(bytes)));
        }
    }
}

//! A bounded, write-once-per-key concurrent map.

use core::fmt;
use core::hash::{BuildHasher, Hash};

use hashbrown::Equivalent;

use crate::hash::{FixedHashState, HashMap};
use crate::sync::{RwLock, read, write};

// -----------------------------------------------------------------------------
// CacheMap

/// A read-mostly cache of pure computations.
///
/// Values are computed by the caller **outside** of any lock and then
/// published with [`insert`](CacheMap::insert). When two threads race on the
/// same key, the first published value wins and both observe it.
///
/// A `capacity` of `0` means unbounded. When a bounded cache is full, the
/// whole table is dropped before the next insertion; entries are pure
/// functions of their keys, so they are simply recomputed.
///
/// # Examples
///
/// ```
/// use vp_utils::CacheMap;
///
/// let cache: CacheMap<u32, &str> = CacheMap::new("example", 0);
///
/// assert_eq!(cache.insert(1, "first"), "first");
/// assert_eq!(cache.insert(1, "second"), "first");
/// assert_eq!(cache.get(&1), Some("first"));
/// ```
pub struct CacheMap<K, V, S = FixedHashState> {
    name: &'static str,
    capacity: usize,
    entries: RwLock<HashMap<K, V, S>>,
}

impl<K, V, S: Default> CacheMap<K, V, S> {
    /// Creates an empty cache. `name` only appears in log messages.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            entries: RwLock::new(HashMap::with_hasher(S::default())),
        }
    }
}

impl<K, V, S> CacheMap<K, V, S> {
    /// The configured capacity, `0` when unbounded.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of published entries.
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    /// Returns `true` if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        read(&self.entries).is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        write(&self.entries).clear();
    }
}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> CacheMap<K, V, S> {
    /// Returns a clone of the published value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        read(&self.entries).get(key).cloned()
    }

    /// Publishes `value` unless another value already exists for `key`,
    /// and returns whichever value is now stored.
    pub fn insert(&self, key: K, value: V) -> V {
        let mut entries = write(&self.entries);
        if let Some(existing) = entries.get(&key) {
            return existing.clone();
        }
        if self.capacity != 0 && entries.len() >= self.capacity {
            log::warn!(
                "cache `{}` reached its capacity of {} entries, evicting all",
                self.name,
                self.capacity,
            );
            entries.clear();
        }
        entries.insert(key, value.clone());
        value
    }

    /// Publishes `value` for `key`, overwriting any existing value.
    pub fn replace(&self, key: K, value: V) -> V {
        let mut entries = write(&self.entries);
        if self.capacity != 0 && entries.len() >= self.capacity && !entries.contains_key(&key) {
            log::warn!(
                "cache `{}` reached its capacity of {} entries, evicting all",
                self.name,
                self.capacity,
            );
            entries.clear();
        }
        entries.insert(key, value.clone());
        value
    }

    /// Returns the value for `key`, computing and publishing it on a miss.
    ///
    /// `f` runs without holding the lock, so it may itself use this cache.
    pub fn get_or_insert_with(&self, key: K, f: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = f();
        self.insert(key, value)
    }

    /// Fallible form of [`get_or_insert_with`](Self::get_or_insert_with).
    /// Errors are returned without publishing anything.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        f: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = f()?;
        Ok(self.insert(key, value))
    }

    /// Removes every entry for which `keep` returns `false`.
    /// Returns the number of removed entries.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) -> usize {
        let mut entries = write(&self.entries);
        let before = entries.len();
        entries.retain(|key, value| keep(key, value));
        before - entries.len()
    }
}

impl<K, V, S> fmt::Debug for CacheMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheMap")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

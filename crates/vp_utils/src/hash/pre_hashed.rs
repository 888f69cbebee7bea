use core::fmt::Debug;
use core::hash::{BuildHasher, Hash, Hasher};
use core::ops::Deref;

use crate::hash::FixedHashState;

// -----------------------------------------------------------------------------
// Hashed

/// A value paired with its pre-computed hash.
///
/// Lookup keys that are hashed many times, such as member signatures,
/// compute their hash once. Equality short circuits on the hash.
///
/// # Examples
///
/// ```
/// use vp_utils::hash::Hashed;
///
/// let a = Hashed::new(("get", 2));
/// let b = Hashed::new(("get", 2));
/// assert_eq!(a, b);
/// assert_eq!(a.hash(), b.hash());
/// ```
pub struct Hashed<V> {
    hash: u64,
    value: V,
}

impl<V: Hash> Hashed<V> {
    /// Pre-hashes the given value using the [`FixedHashState`].
    #[inline]
    pub fn new(value: V) -> Self {
        Self {
            hash: FixedHashState.hash_one(&value),
            value,
        }
    }
}

impl<V> Hashed<V> {
    /// Return the pre-computed hash.
    #[inline(always)]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    /// Extract internal value.
    #[inline(always)]
    pub fn into_inner(self) -> V {
        self.value
    }
}

impl<V> Hash for Hashed<V> {
    #[inline]
    fn hash<R: Hasher>(&self, state: &mut R) {
        state.write_u64(self.hash);
    }
}

impl<V> Deref for Hashed<V> {
    type Target = V;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<V: PartialEq> PartialEq for Hashed<V> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.value.eq(&other.value)
    }
}

impl<V: Eq> Eq for Hashed<V> {}

impl<V: Debug> Debug for Hashed<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hashed")
            .field("hash", &self.hash)
            .field("value", &self.value)
            .finish()
    }
}

impl<V: Clone> Clone for Hashed<V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            value: self.value.clone(),
        }
    }
}

//! Synchronization re-exports and poison-tolerant lock helpers.
//!
//! Every lock in the workspace guards caches of pure, recomputable data,
//! so a poisoned lock still holds a usable value.

pub use std::sync::{Arc, LazyLock, PoisonError};
pub use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Takes a read lock, ignoring poisoning.
#[inline]
pub fn read<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Takes a write lock, ignoring poisoning.
#[inline]
pub fn write<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

//! Lock helpers
//!
//! A panic on one thread must not take down the other real-time loops, so poisoned locks are
//! recovered (with a warning) rather than propagated.

use log::warn;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lock a mutex, recovering it if poisoned.
pub fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e: PoisonError<_>| {
        warn!("Recovering poisoned mutex");
        e.into_inner()
    })
}

/// Acquire a read lock, recovering it if poisoned.
pub fn read<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| {
        warn!("Recovering poisoned read lock");
        e.into_inner()
    })
}

/// Acquire a write lock, recovering it if poisoned.
pub fn write<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| {
        warn!("Recovering poisoned write lock");
        e.into_inner()
    })
}

//! Poison-tolerant guards for the in-process cache store.
//!
//! A panic while a guard is held poisons the lock. The map itself stays
//! usable, so the guard is recovered and the event logged instead of
//! propagating the panic to every later cache call.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<G>(
    poisoned: PoisonError<G>,
    store: &'static str,
    op: &'static str,
    mode: &'static str,
) -> G {
    warn!(
        store,
        op,
        mode,
        hint = "a cached todo snapshot may be missing; readers fall back to the store",
        "Recovered poisoned cache store lock"
    );
    poisoned.into_inner()
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read()
        .unwrap_or_else(|poisoned| recover(poisoned, store, op, "read"))
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write()
        .unwrap_or_else(|poisoned| recover(poisoned, store, op, "write"))
}

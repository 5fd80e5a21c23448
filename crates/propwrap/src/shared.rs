#![forbid(unsafe_code)]

//! Thread-safe wrapper: one exclusive lock per instance.
//!
//! [`SharedWrapper`] serialises every `get`, `set` and `get_projected` on the
//! same instance through a single [`Mutex`], so a writer's `policy.write` sees
//! the slot left by the previous writer and a reader never observes a slot
//! mid-replacement. Share it with `Arc`.
//!
//! A poisoned lock is recovered: the slot is only replaced after the policy's
//! `write` has returned, so a panic inside a policy leaves the previous value.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::policy::{AccessPolicy, Identity};
use crate::projection::{NoProjection, Projection};
use crate::wrapper::ValueWrapper;

pub struct SharedWrapper<T, A = Identity, R = NoProjection> {
    inner: Mutex<ValueWrapper<T, A, R>>,
}

impl<T, A, R> SharedWrapper<T, A, R> {
    #[must_use]
    pub fn new(wrapper: ValueWrapper<T, A, R>) -> Self {
        Self {
            inner: Mutex::new(wrapper),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ValueWrapper<T, A, R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the wrapper while holding the lock.
    ///
    /// `f` must not call back into this `SharedWrapper` (including formatting
    /// it with `{:?}`): the lock is not re-entrant and the call deadlocks.
    pub fn with<U>(&self, f: impl FnOnce(&ValueWrapper<T, A, R>) -> U) -> U {
        f(&self.lock())
    }

    #[must_use]
    pub fn into_inner(self) -> ValueWrapper<T, A, R> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, A: AccessPolicy<T>, R> SharedWrapper<T, A, R> {
    pub fn get(&self) -> std::result::Result<T, A::Error> {
        self.lock().get()
    }

    pub fn set(&self, new: T) -> std::result::Result<(), A::Error> {
        self.lock().set(new)
    }

    /// Read through the policy, transform, and write back under one lock.
    pub fn update(&self, f: impl FnOnce(T) -> T) -> std::result::Result<(), A::Error> {
        let mut wrapper = self.lock();
        let current = wrapper.get()?;
        wrapper.set(f(current))
    }
}

impl<T, A, R: Projection<T>> SharedWrapper<T, A, R> {
    pub fn get_projected(&self) -> Result<R::Output> {
        self.lock().get_projected()
    }
}

impl<T, A, R> From<ValueWrapper<T, A, R>> for SharedWrapper<T, A, R> {
    fn from(wrapper: ValueWrapper<T, A, R>) -> Self {
        Self::new(wrapper)
    }
}

/// Takes the lock; do not format a `SharedWrapper` from inside its own
/// [`with`](SharedWrapper::with) closure.
impl<T: fmt::Debug, A, R> fmt::Debug for SharedWrapper<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWrapper")
            .field("inner", &*self.lock())
            .finish()
    }
}

#![forbid(unsafe_code)]

//! The value wrapper itself.
//!
//! # Design
//!
//! [`ValueWrapper<T, A, R>`] owns one stored value of type `T`, a fixed
//! [`AccessPolicy`] `A`, and an optional [`Projection`] `R`. All reads go
//! through `A::read`, all writes through `A::write`. The projection sees the
//! raw stored value.
//!
//! # Invariants
//!
//! 1. `get()` always applies the policy's `read`; the raw slot is only
//!    reachable through the explicit [`stored()`](ValueWrapper::stored).
//! 2. `set(v)` replaces the slot with `policy.write(v, &slot)`. If the policy
//!    fails, the error is returned and the slot is untouched.
//! 3. `get_projected()` is recomputed from the slot on every call.
//! 4. The policy cannot be replaced after construction.
//!
//! # Failure Modes
//!
//! - **No projection configured**: `get_projected()` returns
//!   [`WrapError::NoProjectionConfigured`] on every call.
//! - **Policy failure**: propagated unchanged as `A::Error`.

use std::convert::Infallible;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{Result, WrapError};
use crate::policy::{AccessPolicy, Clamp, Identity};
use crate::projection::{NoProjection, OverThreshold, Projection, Scalar};

/// A stored value with read/write interception and an optional projection.
pub struct ValueWrapper<T, A = Identity, R = NoProjection> {
    stored: T,
    policy: A,
    projection: Option<R>,
}

impl<T> ValueWrapper<T> {
    /// Wrap `initial` with the identity policy and no projection.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            stored: initial,
            policy: Identity,
            projection: None,
        }
    }

    /// Start composing a wrapper around `initial`.
    #[must_use]
    pub fn builder(initial: T) -> WrapperBuilder<T> {
        WrapperBuilder {
            initial,
            policy: Identity,
            projection: None,
        }
    }
}

impl<T, A> ValueWrapper<T, A> {
    /// Wrap `initial` with `policy` and no projection.
    ///
    /// `initial` is stored as given; the policy only runs on access.
    #[must_use]
    pub fn with_policy(initial: T, policy: A) -> Self {
        Self {
            stored: initial,
            policy,
            projection: None,
        }
    }
}

impl<T: Scalar> ValueWrapper<T, Clamp<T>, OverThreshold<T>> {
    /// Read-time clamp over `range` with an over-threshold flag on the raw value.
    ///
    /// Both halves are built from the same range, so they always agree on `hi`.
    pub fn clamped(initial: T, range: RangeInclusive<T>) -> Result<Self> {
        let projection = OverThreshold::new(range.clone())?;
        let policy = Clamp::new(range)?;
        Ok(Self {
            stored: initial,
            policy,
            projection: Some(projection),
        })
    }
}

impl<T, A: AccessPolicy<T>, R> ValueWrapper<T, A, R> {
    /// The value as seen through the policy.
    pub fn get(&self) -> std::result::Result<T, A::Error> {
        self.policy.read(&self.stored)
    }

    /// Pass `new` through the policy and store the result.
    pub fn set(&mut self, new: T) -> std::result::Result<(), A::Error> {
        let next = self.policy.write(new, &self.stored).inspect_err(|_| {
            tracing::trace!(message = "wrapper.set", outcome = "rejected");
        })?;
        self.stored = next;
        tracing::trace!(message = "wrapper.set", outcome = "stored");
        Ok(())
    }
}

impl<T, A: AccessPolicy<T, Error = Infallible>, R> ValueWrapper<T, A, R> {
    /// [`get`](Self::get) for policies that cannot fail.
    #[must_use]
    pub fn value(&self) -> T {
        match self.get() {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }

    /// [`set`](Self::set) for policies that cannot fail.
    pub fn assign(&mut self, new: T) {
        match self.set(new) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
}

impl<T, A, R: Projection<T>> ValueWrapper<T, A, R> {
    /// The projected value for the current stored value.
    pub fn get_projected(&self) -> Result<R::Output> {
        self.projection
            .as_ref()
            .map(|projection| projection.project(&self.stored))
            .ok_or(WrapError::NoProjectionConfigured)
    }
}

impl<T, A, R> ValueWrapper<T, A, R> {
    /// The raw stored value, bypassing the policy.
    #[must_use]
    pub fn stored(&self) -> &T {
        &self.stored
    }

    #[must_use]
    pub fn policy(&self) -> &A {
        &self.policy
    }

    #[must_use]
    pub fn has_projection(&self) -> bool {
        self.projection.is_some()
    }

    /// Consume the wrapper, returning the raw stored value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.stored
    }
}

impl<T: Default> Default for ValueWrapper<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug, A, R> fmt::Debug for ValueWrapper<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueWrapper")
            .field("stored", &self.stored)
            .field("policy", &std::any::type_name::<A>())
            .field("has_projection", &self.projection.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Composes a [`ValueWrapper`] from an initial value, a policy and a projection.
///
/// Each setter changes the builder's type parameter, so the finished wrapper
/// carries the concrete policy and projection types.
#[must_use]
pub struct WrapperBuilder<T, A = Identity, R = NoProjection> {
    initial: T,
    policy: A,
    projection: Option<R>,
}

impl<T, A, R> WrapperBuilder<T, A, R> {
    pub fn policy<B>(self, policy: B) -> WrapperBuilder<T, B, R> {
        WrapperBuilder {
            initial: self.initial,
            policy,
            projection: self.projection,
        }
    }

    pub fn projection<S>(self, projection: S) -> WrapperBuilder<T, A, S> {
        WrapperBuilder {
            initial: self.initial,
            policy: self.policy,
            projection: Some(projection),
        }
    }

    pub fn build(self) -> ValueWrapper<T, A, R> {
        ValueWrapper {
            stored: self.initial,
            policy: self.policy,
            projection: self.projection,
        }
    }
}

impl<T: fmt::Debug, A, R> fmt::Debug for WrapperBuilder<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperBuilder")
            .field("initial", &self.initial)
            .field("has_projection", &self.projection.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

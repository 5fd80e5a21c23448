#![forbid(unsafe_code)]

//! Accessor policies: the read/write transforms a [`ValueWrapper`] applies
//! around its stored value.
//!
//! # Invariants
//!
//! 1. `read` never mutates the stored value.
//! 2. The value returned by `write` is exactly what the wrapper stores next.
//! 3. A policy is fixed for the lifetime of the wrapper that owns it.
//!
//! [`ValueWrapper`]: crate::ValueWrapper

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{Result, WrapError};

/// Read/write interception applied on every access to a wrapped value.
pub trait AccessPolicy<T> {
    /// Failure raised by the policy. In-memory policies use [`Infallible`].
    type Error;

    /// Produce the value a reader sees, given the current stored value.
    fn read(&self, stored: &T) -> std::result::Result<T, Self::Error>;

    /// Produce the value to store, given the incoming value and the current one.
    fn write(&self, new: T, stored: &T) -> std::result::Result<T, Self::Error>;
}

/// Pass-through policy: reads return the stored value, writes store the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl<T: Clone> AccessPolicy<T> for Identity {
    type Error = Infallible;

    fn read(&self, stored: &T) -> std::result::Result<T, Infallible> {
        Ok(stored.clone())
    }

    fn write(&self, new: T, _stored: &T) -> std::result::Result<T, Infallible> {
        Ok(new)
    }
}

/// Infallible policy assembled from a read closure and a write closure.
#[derive(Clone)]
pub struct FnPolicy<R, W> {
    read: R,
    write: W,
}

impl<R, W> FnPolicy<R, W> {
    #[must_use]
    pub fn new(read: R, write: W) -> Self {
        Self { read, write }
    }
}

impl<R, W> fmt::Debug for FnPolicy<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPolicy").finish_non_exhaustive()
    }
}

impl<T, R, W> AccessPolicy<T> for FnPolicy<R, W>
where
    R: Fn(&T) -> T,
    W: Fn(T, &T) -> T,
{
    type Error = Infallible;

    fn read(&self, stored: &T) -> std::result::Result<T, Infallible> {
        Ok((self.read)(stored))
    }

    fn write(&self, new: T, stored: &T) -> std::result::Result<T, Infallible> {
        Ok((self.write)(new, stored))
    }
}

/// Read-time range clamp.
///
/// Writes are stored raw; only reads are clamped into `[lo, hi]`. A projection
/// evaluated against the stored value therefore still sees out-of-range input.
///
/// Unordered stored values (a float NaN) read as `lo`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clamp<T> {
    lo: T,
    hi: T,
}

impl<T: PartialOrd> Clamp<T> {
    /// Build a clamp over `range`.
    ///
    /// Fails with [`WrapError::InvalidConfiguration`] when the range is empty
    /// or its bounds cannot be ordered.
    pub fn new(range: RangeInclusive<T>) -> Result<Self> {
        let (lo, hi) = range.into_inner();
        match lo.partial_cmp(&hi) {
            Some(Ordering::Less | Ordering::Equal) => Ok(Self { lo, hi }),
            Some(Ordering::Greater) => Err(WrapError::invalid("clamp range is empty (lo > hi)")),
            None => Err(WrapError::invalid("clamp range bounds are unordered")),
        }
    }

    #[must_use]
    pub fn lo(&self) -> &T {
        &self.lo
    }

    #[must_use]
    pub fn hi(&self) -> &T {
        &self.hi
    }

    /// Whether `value` already lies inside the range.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        *value >= self.lo && *value <= self.hi
    }
}

impl<T: PartialOrd + Clone> Clamp<T> {
    /// `min(max(lo, value), hi)`.
    #[must_use]
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn apply(&self, value: &T) -> T {
        // Written as a negated `>=` so NaN falls to `lo`.
        if !(*value >= self.lo) {
            self.lo.clone()
        } else if *value > self.hi {
            self.hi.clone()
        } else {
            value.clone()
        }
    }
}

impl<T: PartialOrd + Clone> AccessPolicy<T> for Clamp<T> {
    type Error = Infallible;

    fn read(&self, stored: &T) -> std::result::Result<T, Infallible> {
        Ok(self.apply(stored))
    }

    fn write(&self, new: T, _stored: &T) -> std::result::Result<T, Infallible> {
        Ok(new)
    }
}

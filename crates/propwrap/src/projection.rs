#![forbid(unsafe_code)]

//! Projected values: secondary read-only values derived from a wrapper's raw
//! stored value.
//!
//! A projection is evaluated against the **stored** value, not the value a
//! policy's `read` would return. For a read-time clamp this means the projection
//! still sees input that lies outside the clamp range.
//!
//! Projections are recomputed on every access; nothing here caches.

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use crate::error::{Result, WrapError};

/// A pure function of the stored value.
pub trait Projection<T> {
    type Output;

    fn project(&self, stored: &T) -> Self::Output;
}

impl<T, P, F> Projection<T> for F
where
    F: Fn(&T) -> P,
{
    type Output = P;

    fn project(&self, stored: &T) -> P {
        self(stored)
    }
}

/// Placeholder projection type for wrappers built without one.
///
/// A wrapper typed with `NoProjection` never holds an instance, so
/// `get_projected()` always fails with [`WrapError::NoProjectionConfigured`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoProjection;

impl<T> Projection<T> for NoProjection {
    type Output = ();

    fn project(&self, _stored: &T) {}
}

// ---------------------------------------------------------------------------
// Threshold arithmetic
// ---------------------------------------------------------------------------

/// Numeric types an [`OverThreshold`] projection can be computed over.
pub trait Scalar: Copy + PartialOrd {
    /// `self * numerator / denominator`, or `None` when the result is not
    /// representable in `Self`.
    ///
    /// Integer implementations truncate toward zero exactly like the literal
    /// expression. The intermediate product is never formed, so only a result
    /// that itself overflows yields `None`. `denominator` must be non-zero.
    fn scale(self, numerator: u8, denominator: u8) -> Option<Self>;
}

macro_rules! impl_scalar_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl Scalar for $t {
                #[allow(unreachable_patterns)]
                fn scale(self, numerator: u8, denominator: u8) -> Option<Self> {
                    // self = q * den + r, with r carrying the sign of self. A
                    // denominator too wide for the type exceeds |self|, so q = 0.
                    let (q, r) = match <$t>::try_from(denominator) {
                        Ok(den) => (self / den, self % den),
                        Err(_) => (0, self),
                    };
                    let head = if q == 0 {
                        0
                    } else {
                        q.checked_mul(<$t>::try_from(numerator).ok()?)?
                    };
                    // |r| < denominator, so this product fits comfortably.
                    let tail = i128::try_from(r).ok()? * i128::from(numerator)
                        / i128::from(denominator);
                    head.checked_add(<$t>::try_from(tail).ok()?)
                }
            }
        )*
    };
}

impl_scalar_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Scalar for f32 {
    fn scale(self, numerator: u8, denominator: u8) -> Option<Self> {
        let scaled = self * f32::from(numerator) / f32::from(denominator);
        (scaled.is_finite() || self.is_infinite()).then_some(scaled)
    }
}

impl Scalar for f64 {
    fn scale(self, numerator: u8, denominator: u8) -> Option<Self> {
        let scaled = self * f64::from(numerator) / f64::from(denominator);
        (scaled.is_finite() || self.is_infinite()).then_some(scaled)
    }
}

/// Fraction of the upper bound above which a value counts as "over".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdRatio {
    pub numerator: u8,
    pub denominator: u8,
}

impl ThresholdRatio {
    /// Build a ratio; a zero denominator is rejected.
    pub fn new(numerator: u8, denominator: u8) -> Result<Self> {
        if denominator == 0 {
            return Err(WrapError::invalid("threshold ratio denominator is zero"));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

impl Default for ThresholdRatio {
    /// Six tenths.
    fn default() -> Self {
        Self {
            numerator: 6,
            denominator: 10,
        }
    }
}

/// "Is the raw stored value dangerously high" flag.
///
/// `project(v) = v > hi * numerator / denominator`, 6/10 by default. For the
/// range `[0, 150]` the threshold is `90`; for `[0, 15]` it is `9`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverThreshold<T> {
    threshold: T,
}

impl<T: Scalar> OverThreshold<T> {
    /// Threshold at six tenths of the range's upper bound.
    pub fn new(range: RangeInclusive<T>) -> Result<Self> {
        Self::with_ratio(range, ThresholdRatio::default())
    }

    /// Threshold at `hi * ratio`.
    ///
    /// Fails with [`WrapError::InvalidConfiguration`] for an empty range, a
    /// zero denominator, or a threshold the type cannot represent.
    pub fn with_ratio(range: RangeInclusive<T>, ratio: ThresholdRatio) -> Result<Self> {
        let (lo, hi) = range.into_inner();
        match lo.partial_cmp(&hi) {
            Some(Ordering::Less | Ordering::Equal) => {}
            Some(Ordering::Greater) => {
                return Err(WrapError::invalid("threshold range is empty (lo > hi)"));
            }
            None => return Err(WrapError::invalid("threshold range bounds are unordered")),
        }
        // Checked here as well: a deserialized ratio never went through `new`.
        if ratio.denominator == 0 {
            return Err(WrapError::invalid("threshold ratio denominator is zero"));
        }
        let threshold = hi
            .scale(ratio.numerator, ratio.denominator)
            .ok_or_else(|| WrapError::invalid("threshold does not fit the value type"))?;
        Ok(Self { threshold })
    }

    #[must_use]
    pub fn threshold(&self) -> T {
        self.threshold
    }
}

impl<T: Scalar> Projection<T> for OverThreshold<T> {
    type Output = bool;

    fn project(&self, stored: &T) -> bool {
        *stored > self.threshold
    }
}

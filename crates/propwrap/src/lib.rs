#![forbid(unsafe_code)]

//! Value wrappers with pluggable accessor policies.
//!
//! A [`ValueWrapper`] owns a stored value and routes every read and write
//! through an [`AccessPolicy`]. It can also carry a [`Projection`]: a derived,
//! read-only value computed from the raw stored value on every access.
//!
//! - [`Clamp`]: read-time range clamp; writes are stored raw.
//! - [`OverThreshold`]: `stored > hi * 6 / 10`, evaluated on the raw value.
//! - [`StoreBacked`]: value lives in an injected [`KeyValueStore`], with a
//!   default when the key is absent.
//! - [`FnPolicy`] / [`Identity`]: closure-built and pass-through policies.
//! - [`SharedWrapper`]: the same wrapper behind one lock per instance.
//! - [`Settings`]: typed, process-wide settings over a JSON-valued backend
//!   (feature `settings`).
//!
//! # Example
//!
//! ```
//! use propwrap::{Clamp, OverThreshold, ValueWrapper};
//!
//! struct Speaker {
//!     volume: ValueWrapper<i32, Clamp<i32>, OverThreshold<i32>>,
//! }
//!
//! let mut speaker = Speaker {
//!     volume: ValueWrapper::clamped(0, 0..=150)?,
//! };
//!
//! speaker.volume.assign(80);
//! assert_eq!(speaker.volume.value(), 80);
//! assert!(!speaker.volume.get_projected()?); // threshold is 150 * 6 / 10 = 90
//!
//! speaker.volume.assign(400);
//! assert_eq!(speaker.volume.value(), 150);
//! assert_eq!(*speaker.volume.stored(), 400);
//! assert!(speaker.volume.get_projected()?);
//! # Ok::<(), propwrap::WrapError>(())
//! ```

pub mod error;
pub mod policy;
pub mod projection;
#[cfg(feature = "settings")]
pub mod settings;
pub mod shared;
pub mod store;
pub mod wrapper;

pub use error::{BoxError, Result, WrapError};
pub use policy::{AccessPolicy, Clamp, FnPolicy, Identity};
pub use projection::{NoProjection, OverThreshold, Projection, Scalar, ThresholdRatio};
#[cfg(feature = "settings")]
pub use settings::{Settings, SettingsError};
pub use shared::SharedWrapper;
pub use store::{KeyValueStore, MemoryStore, StoreBacked};
pub use wrapper::{ValueWrapper, WrapperBuilder};

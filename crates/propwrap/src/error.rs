#![forbid(unsafe_code)]

//! Error types for wrapper construction and projected reads.

use std::convert::Infallible;
use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error carried verbatim from an external collaborator.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, WrapError>;

#[derive(Debug, Error)]
pub enum WrapError {
    /// `get_projected()` was called on a wrapper built without a projection.
    #[error("no projection configured for this wrapper")]
    NoProjectionConfigured,

    #[error("external collaborator failed: {0}")]
    ExternalCollaborator(#[source] BoxError),

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl WrapError {
    /// Fold a store or backend failure into a `WrapError`, keeping it as the source.
    #[must_use]
    pub fn external(err: impl Into<BoxError>) -> Self {
        Self::ExternalCollaborator(err.into())
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Whether this error originated outside the wrapper.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalCollaborator(_))
    }
}

impl From<Infallible> for WrapError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

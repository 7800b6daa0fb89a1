/// Convenience result type used across pixmix.
pub type PixmixResult<T> = Result<T, PixmixError>;

/// Top-level error taxonomy used by the public API.
///
/// Hot paths never return errors: everything here is raised while images, filters or
/// implementation chains are being set up, or at the `composite` boundary.
#[derive(thiserror::Error, Debug)]
pub enum PixmixError {
    /// Invalid caller-provided geometry, storage or parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// A backend was requested that this CPU cannot run.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Pixel storage or filter parameters could not be allocated.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixmixError {
    /// Build a [`PixmixError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixmixError::Unsupported`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`PixmixError::Allocation`] value.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }
}

impl From<std::collections::TryReserveError> for PixmixError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::Allocation(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

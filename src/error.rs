//! Crate-specific errors.

use thiserror::Error;

/// Crate-specific errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The file signature was not "HEAD".
    #[error("invalid file signature: {0:?}")]
    InvalidMagic([u8; 4]),

    /// The input ends inside the header region.
    #[error("the input ends inside the header region after {0} bytes")]
    HeaderTooShort(usize),

    /// Wrapper around `std::io::Error`.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
